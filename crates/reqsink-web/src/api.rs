//! Admin JSON API
//!
//! Read and manage captures and user accounts over JSON. Mounted under
//! `/b/api` behind the API auth middleware; mutating user endpoints
//! additionally require the admin role.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use reqsink_db::entities::user;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use tracing::{error, info};
use uuid::Uuid;

use crate::middleware::AuthUser;
use crate::models::{
    CaptureDto, CaptureList, CaptureListQuery, CreateUserRequest, ErrorResponse, HealthResponse,
    UserDto, UserList,
};
use crate::store::StoreError;
use crate::AppState;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn db_error(err: sea_orm::DbErr) -> ApiError {
    error!("Database error: {}", err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Internal server error".to_string(),
            code: Some("STORAGE".to_string()),
        }),
    )
}

fn not_found(what: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("{} not found", what),
            code: Some("NOT_FOUND".to_string()),
        }),
    )
}

/// Mutating user endpoints need the admin role. When `require_auth` is off
/// the auth middleware inserts no identity and everything is permitted.
fn require_admin(auth: Option<&AuthUser>) -> Result<(), ApiError> {
    match auth {
        None => Ok(()),
        Some(user) if user.role == user::UserRole::Admin => Ok(()),
        Some(user) => {
            info!(username = %user.username, "Rejected non-admin user management request");
            Err((
                StatusCode::FORBIDDEN,
                Json(ErrorResponse {
                    error: "Admin role required".to_string(),
                    code: Some("FORBIDDEN".to_string()),
                }),
            ))
        }
    }
}

/// Health check
#[utoipa::path(
    get,
    path = "/b/api/health",
    responses(
        (status = 200, description = "Service health", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let status = match state.db.ping().await {
        Ok(()) => "healthy",
        Err(_) => "degraded",
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// List captured requests, newest first
#[utoipa::path(
    get,
    path = "/b/api/requests",
    params(
        ("domain" = Option<String>, Query, description = "Exact domain match"),
        ("offset" = Option<u64>, Query, description = "Pagination offset"),
        ("limit" = Option<u64>, Query, description = "Page size (max 100)")
    ),
    responses(
        (status = 200, description = "Page of captures", body = CaptureList),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "captures"
)]
pub async fn list_captures(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CaptureListQuery>,
) -> Result<Json<CaptureList>, ApiError> {
    use reqsink_db::entities::capture;

    let mut condition = Condition::all();
    if let Some(ref domain) = query.domain {
        condition = condition.add(capture::Column::Domain.eq(domain.as_str()));
    }

    let offset = query.offset.unwrap_or(0);
    let limit = query.limit.unwrap_or(25).clamp(1, 100);

    let total = capture::Entity::find()
        .filter(condition.clone())
        .count(&state.db)
        .await
        .map_err(db_error)? as usize;

    // Row offset, not a page index: offset=3 skips exactly three rows
    let page = capture::Entity::find()
        .filter(condition)
        .order_by_desc(capture::Column::Id)
        .offset(offset)
        .limit(limit)
        .all(&state.db)
        .await
        .map_err(db_error)?;

    Ok(Json(CaptureList {
        requests: page.into_iter().map(CaptureDto::from).collect(),
        total,
        offset: offset as usize,
        limit: limit as usize,
    }))
}

/// Fetch a single capture by its public id
#[utoipa::path(
    get,
    path = "/b/api/requests/{public_id}",
    params(
        ("public_id" = Uuid, Path, description = "Opaque capture identifier")
    ),
    responses(
        (status = 200, description = "The capture", body = CaptureDto),
        (status = 404, description = "No such capture", body = ErrorResponse)
    ),
    tag = "captures"
)]
pub async fn get_capture(
    State(state): State<Arc<AppState>>,
    Path(public_id): Path<Uuid>,
) -> Result<Json<CaptureDto>, ApiError> {
    match state.store.get_by_public_id(public_id).await {
        Ok(model) => Ok(Json(model.into())),
        Err(StoreError::NotFound) => Err(not_found("Capture")),
        Err(StoreError::Storage(err)) => Err(db_error(err)),
    }
}

/// Delete a capture
#[utoipa::path(
    delete,
    path = "/b/api/requests/{public_id}",
    params(
        ("public_id" = Uuid, Path, description = "Opaque capture identifier")
    ),
    responses(
        (status = 204, description = "Capture deleted"),
        (status = 404, description = "No such capture", body = ErrorResponse)
    ),
    tag = "captures"
)]
pub async fn delete_capture(
    State(state): State<Arc<AppState>>,
    Path(public_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    match state.store.delete_by_public_id(public_id).await {
        Ok(()) => {
            info!("Deleted capture {}", public_id);
            Ok(StatusCode::NO_CONTENT)
        }
        Err(StoreError::NotFound) => Err(not_found("Capture")),
        Err(StoreError::Storage(err)) => Err(db_error(err)),
    }
}

/// List user accounts
#[utoipa::path(
    get,
    path = "/b/api/users",
    responses(
        (status = 200, description = "All user accounts", body = UserList),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<UserList>, ApiError> {
    let users = user::Entity::find()
        .order_by_asc(user::Column::Username)
        .all(&state.db)
        .await
        .map_err(db_error)?;

    let total = users.len();
    Ok(Json(UserList {
        users: users.into_iter().map(UserDto::from).collect(),
        total,
    }))
}

/// Create a user account (admin only)
#[utoipa::path(
    post,
    path = "/b/api/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserDto),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 409, description = "Username already taken", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    auth: Option<Extension<AuthUser>>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserDto>), ApiError> {
    require_admin(auth.as_ref().map(|ext| &ext.0))?;

    let existing = user::Entity::find()
        .filter(user::Column::Username.eq(request.username.as_str()))
        .one(&state.db)
        .await
        .map_err(db_error)?;
    if existing.is_some() {
        return Err((
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: format!("Username '{}' is already taken", request.username),
                code: Some("USERNAME_TAKEN".to_string()),
            }),
        ));
    }

    let password_hash = reqsink_auth::hash_password(&request.password).map_err(|err| {
        error!("Failed to hash password: {}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Internal server error".to_string(),
                code: Some("HASHING".to_string()),
            }),
        )
    })?;

    let now = Utc::now();
    let model = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(request.username),
        password_hash: Set(password_hash),
        role: Set(if request.admin {
            user::UserRole::Admin
        } else {
            user::UserRole::User
        }),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let created = model.insert(&state.db).await.map_err(db_error)?;
    info!(username = %created.username, "Created user account");

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Delete a user account (admin only)
#[utoipa::path(
    delete,
    path = "/b/api/users/{id}",
    params(
        ("id" = Uuid, Path, description = "User account id")
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 404, description = "No such user", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    auth: Option<Extension<AuthUser>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    require_admin(auth.as_ref().map(|ext| &ext.0))?;

    let result = user::Entity::delete_by_id(id)
        .exec(&state.db)
        .await
        .map_err(db_error)?;

    if result.rows_affected == 0 {
        return Err(not_found("User"));
    }

    info!("Deleted user account {}", id);
    Ok(StatusCode::NO_CONTENT)
}
