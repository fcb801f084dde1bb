//! Error mapping for the page handlers
//!
//! A failed capture is never fatal to the process: storage errors become a
//! generic 500 page for that one caller, permalink misses a 404 page.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::render;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The request body could not be read off the transport. Nothing was
    /// recorded for this request.
    #[error("failed to read request body")]
    BodyRead,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Store(StoreError::NotFound) => {
                (StatusCode::NOT_FOUND, render::not_found_page()).into_response()
            }
            AppError::Store(err @ StoreError::Storage(_)) => {
                error!("Storage error while handling request: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, render::error_page()).into_response()
            }
            AppError::BodyRead => {
                (StatusCode::INTERNAL_SERVER_ERROR, render::error_page()).into_response()
            }
        }
    }
}
