//! Wire models for the admin JSON API

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use reqsink_db::entities::{capture, user};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Error payload returned by the admin API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
    /// Machine-readable error code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// A stored capture as exposed to the admin API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CaptureDto {
    /// Insertion ordinal (internal sort key)
    pub ordinal: i64,
    /// Opaque permalink identifier
    pub public_id: Uuid,
    /// HTTP method as received
    pub method: String,
    /// Path component of the captured URL
    pub url_path: String,
    /// Raw query string, empty when absent
    pub query_params: String,
    /// Host header at capture time
    pub domain: String,
    /// Request headers, decoded
    pub headers: BTreeMap<String, String>,
    /// Request body as text
    pub body: String,
    /// When the request was captured
    pub made_at: DateTime<Utc>,
}

impl From<capture::Model> for CaptureDto {
    fn from(model: capture::Model) -> Self {
        let headers: BTreeMap<String, String> =
            serde_json::from_str(&model.headers).unwrap_or_default();

        Self {
            ordinal: model.id,
            public_id: model.public_id,
            method: model.method,
            url_path: model.url_path,
            query_params: model.query_params,
            domain: model.domain,
            headers,
            body: model.body,
            made_at: model.made_at,
        }
    }
}

/// Page of captures with pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CaptureList {
    pub requests: Vec<CaptureDto>,
    /// Total count without pagination
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
}

/// Query parameters for filtering captures
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CaptureListQuery {
    /// Exact domain match
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Pagination offset (default: 0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    /// Pagination limit (default: 25, max: 100)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

/// A user account as exposed to the admin API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserDto {
    pub id: Uuid,
    pub username: String,
    /// "admin" or "user"
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for UserDto {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            role: match model.role {
                user::UserRole::Admin => "admin".to_string(),
                user::UserRole::User => "user".to_string(),
            },
            is_active: model.is_active,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserList {
    pub users: Vec<UserDto>,
    pub total: usize,
}

/// Request to create a user account
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    /// Grant the admin role
    #[serde(default)]
    pub admin: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Login form fields (HTML form, not part of the JSON API)
#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

/// Change-password form fields (HTML form, not part of the JSON API)
#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub new_password_again: String,
}
