//! Error types for the content cache server
//!
//! Cache primitives cannot fail; everything here originates in the document
//! store or in request validation.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::document::StoreError;

// == App Error Enum ==
/// Unified error type for services and HTTP handlers.
#[derive(Error, Debug, Clone)]
pub enum AppError {
    /// Requested record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Document store failure, passed through unchanged
    #[error(transparent)]
    Store(#[from] StoreError),
}

// == IntoResponse Implementation ==
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) | AppError::Store(StoreError::NotFound { .. }) => {
                StatusCode::NOT_FOUND
            }
            AppError::InvalidRequest(_) | AppError::Store(StoreError::Invalid(_)) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Store(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Store(StoreError::Decode(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for services and handlers.
pub type Result<T> = std::result::Result<T, AppError>;
