//! Middleware for session authentication

pub mod auth;

pub use auth::{
    current_user, require_auth_api, require_auth_page, session_token_from_headers, AuthUser,
    SESSION_COOKIE,
};
