//! HTML page handlers: the catch-all capture route, the permalink view,
//! and the login/logout flow.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use chrono::{Duration, Utc};
use http_body_util::LengthLimitError;
use maud::Markup;
use reqsink_db::entities::user;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, Set};
use serde::Deserialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::{current_user, SESSION_COOKIE};
use crate::models::{ChangePasswordForm, LoginForm};
use crate::recorder::{InboundRequest, MAX_CAPTURE_BODY_BYTES};
use crate::render;
use crate::store::StoreError;
use crate::AppState;

/// Catch-all route: record the inbound request (any path, any method),
/// then render the dashboard of recent captures.
pub async fn catch_all(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Markup, AppError> {
    let (parts, body) = request.into_parts();

    // Self-origin check only costs a lookup when suppression is enabled
    let from_self =
        state.config.ignore_from_self && current_user(&state, &parts.headers).await.is_some();

    // Read the body to completion. Oversized bodies degrade to empty; a
    // transport error mid-read means nothing gets recorded.
    let body_bytes = match axum::body::to_bytes(body, MAX_CAPTURE_BODY_BYTES).await {
        Ok(bytes) => bytes.to_vec(),
        Err(err) if is_length_limit(&err) => Vec::new(),
        Err(err) => {
            warn!("Failed to read request body: {}", err);
            return Err(AppError::BodyRead);
        }
    };

    let inbound =
        InboundRequest::from_parts(&parts.method, &parts.uri, &parts.headers, body_bytes, from_self);
    let host = inbound.headers.get("host").cloned().unwrap_or_default();

    // Insert strictly precedes the list read: the response to this request
    // already shows its own capture.
    state.recorder.record(inbound).await?;

    let domain_filter = state
        .config
        .only_show_current_domain
        .then_some(host.as_str());
    let entries = state
        .queries
        .recent_for_dashboard(domain_filter, state.config.hide_query_params)
        .await?;

    Ok(render::dashboard_page(
        &entries,
        state.config.hide_urls,
        Utc::now(),
    ))
}

/// Permalink view of a single capture.
pub async fn view_capture(
    State(state): State<Arc<AppState>>,
    Path(public_id): Path<String>,
) -> Result<Markup, AppError> {
    // An unparsable id is indistinguishable from an unknown one
    let public_id = Uuid::parse_str(&public_id).map_err(|_| StoreError::NotFound)?;

    let capture = state.queries.fetch_for_permalink(public_id).await?;

    Ok(render::capture_page(&capture.into(), Utc::now()))
}

#[derive(Debug, Deserialize)]
pub struct NextQuery {
    #[serde(default)]
    pub next: Option<String>,
}

pub async fn login_form(Query(query): Query<NextQuery>) -> Markup {
    render::login_page(None, sanitize_next(query.next.as_deref()))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Form(form): Form<LoginForm>,
) -> Response {
    let next = sanitize_next(form.next.as_deref()).to_string();

    let found = match user::Entity::find()
        .filter(user::Column::Username.eq(form.username.as_str()))
        .one(&state.db)
        .await
    {
        Ok(found) => found.filter(|u| u.is_active),
        Err(err) => {
            error!("Database error during login: {}", err);
            return (StatusCode::INTERNAL_SERVER_ERROR, render::error_page()).into_response();
        }
    };

    let account = match found {
        Some(account)
            if reqsink_auth::verify_password(&form.password, &account.password_hash)
                .unwrap_or(false) =>
        {
            account
        }
        _ => {
            warn!(username = %form.username, "Failed login attempt");
            return (
                StatusCode::UNAUTHORIZED,
                render::login_page(Some("Invalid username or password"), &next),
            )
                .into_response();
        }
    };

    let token = match reqsink_auth::issue_session(
        state.config.session_secret.as_bytes(),
        account.id,
        Duration::hours(state.config.session_hours),
    ) {
        Ok(token) => token,
        Err(err) => {
            error!("Failed to issue session token: {}", err);
            return (StatusCode::INTERNAL_SERVER_ERROR, render::error_page()).into_response();
        }
    };

    info!(username = %account.username, "Operator signed in");

    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        token,
        state.config.session_hours * 3600
    );

    ([(header::SET_COOKIE, cookie)], Redirect::to(&next)).into_response()
}

pub async fn logout() -> impl IntoResponse {
    let cookie = format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        SESSION_COOKIE
    );

    ([(header::SET_COOKIE, cookie)], Redirect::to("/"))
}

/// Change-password form. Self-gated by the session cookie regardless of
/// the `require_auth` flag, since it only makes sense for a logged-in
/// operator.
pub async fn password_form(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Response {
    if current_user(&state, &headers).await.is_none() {
        return Redirect::to("/b/login?next=/b/password").into_response();
    }

    render::password_page(None).into_response()
}

pub async fn change_password(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<ChangePasswordForm>,
) -> Response {
    let account = match current_user(&state, &headers).await {
        Some(account) => account,
        None => return Redirect::to("/b/login?next=/b/password").into_response(),
    };

    if form.new_password != form.new_password_again {
        return (
            StatusCode::BAD_REQUEST,
            render::password_page(Some("New password fields did not match")),
        )
            .into_response();
    }

    let current_ok = reqsink_auth::verify_password(&form.current_password, &account.password_hash)
        .unwrap_or(false);
    if !current_ok {
        warn!(username = %account.username, "Rejected password change with wrong current password");
        return (
            StatusCode::UNAUTHORIZED,
            render::password_page(Some("Your current password was wrong")),
        )
            .into_response();
    }

    let password_hash = match reqsink_auth::hash_password(&form.new_password) {
        Ok(hash) => hash,
        Err(err) => {
            error!("Failed to hash new password: {}", err);
            return (StatusCode::INTERNAL_SERVER_ERROR, render::error_page()).into_response();
        }
    };

    let username = account.username.clone();
    let mut update = account.into_active_model();
    update.password_hash = Set(password_hash);
    update.updated_at = Set(Utc::now());
    if let Err(err) = update.update(&state.db).await {
        error!("Failed to update password: {}", err);
        return (StatusCode::INTERNAL_SERVER_ERROR, render::error_page()).into_response();
    }

    info!(username = %username, "Operator changed their password");

    // Clear the session and ask for a fresh login with the new password
    let cookie = format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        SESSION_COOKIE
    );
    ([(header::SET_COOKIE, cookie)], Redirect::to("/b/login")).into_response()
}

/// True when the read failed only because the body exceeded the capture
/// size cap, as opposed to a transport error.
fn is_length_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(inner) = source {
        if inner.downcast_ref::<LengthLimitError>().is_some() {
            return true;
        }
        source = inner.source();
    }
    false
}

/// Only ever redirect back to a local path.
fn sanitize_next(next: Option<&str>) -> &str {
    match next {
        Some(n) if n.starts_with('/') && !n.starts_with("//") => n,
        _ => "/",
    }
}
