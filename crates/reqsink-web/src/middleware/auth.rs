//! Session Authentication Middleware
//!
//! Validates the session cookie minted at login and makes the operator's
//! identity available to handlers via Axum's Extension. Two flavors:
//! page routes redirect to the login form, API routes answer 401 JSON.
//!
//! When `require_auth` is off both middlewares pass every request through;
//! the cookie is then only consulted for self-origin suppression.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use reqsink_db::entities::user;
use sea_orm::EntityTrait;
use tracing::debug;

use crate::models::ErrorResponse;
use crate::AppState;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "reqsink_session";

/// Authenticated operator context extracted from the session
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: uuid::Uuid,
    pub username: String,
    pub role: user::UserRole,
}

impl From<user::Model> for AuthUser {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            role: model.role,
        }
    }
}

/// Pull the session token out of the Cookie header, if present.
pub fn session_token_from_headers(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;

    cookies
        .split(';')
        .map(|c| c.trim())
        .find_map(|c| {
            c.strip_prefix(SESSION_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
        })
        .map(|token| token.to_string())
}

/// Resolve the request's session cookie to an active user, if any.
///
/// This is also the "self-originated" signal: a request that resolves here
/// came from an authenticated operator of this instance.
pub async fn current_user(state: &AppState, headers: &HeaderMap) -> Option<user::Model> {
    let token = session_token_from_headers(headers)?;

    let claims =
        reqsink_auth::validate_session(state.config.session_secret.as_bytes(), &token).ok()?;
    let user_id = claims.user_id()?;

    user::Entity::find_by_id(user_id)
        .one(&state.db)
        .await
        .ok()
        .flatten()
        .filter(|u| u.is_active)
}

/// Auth middleware for HTML page routes: unauthenticated requests are
/// redirected to the login form with a `next` destination.
pub async fn require_auth_page(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    if !state.config.require_auth {
        return next.run(request).await;
    }

    match current_user(&state, request.headers()).await {
        Some(user) => {
            request.extensions_mut().insert(AuthUser::from(user));
            next.run(request).await
        }
        None => {
            debug!(path = %request.uri().path(), "Redirecting unauthenticated request to login");
            let next_route = request
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_else(|| "/".to_string());
            Redirect::to(&format!("/b/login?next={}", encode_component(&next_route)))
                .into_response()
        }
    }
}

/// Auth middleware for the admin JSON API: unauthenticated requests get
/// a 401 with an error payload instead of a redirect.
pub async fn require_auth_api(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    if !state.config.require_auth {
        return next.run(request).await;
    }

    match current_user(&state, request.headers()).await {
        Some(user) => {
            request.extensions_mut().insert(AuthUser::from(user));
            next.run(request).await
        }
        None => (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "Missing or invalid session".to_string(),
                code: Some("UNAUTHENTICATED".to_string()),
            }),
        )
            .into_response(),
    }
}

/// Minimal percent-encoding for a query component value.
fn encode_component(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' | b'/' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}
