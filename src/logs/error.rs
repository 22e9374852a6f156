use axum::response::{IntoResponse, Response};
use thiserror::Error;
use uuid::Uuid;

use crate::error::{ApiError, StoreError};
use crate::logs::ownership::Forbidden;

/// Errors produced by log entry operations
#[derive(Debug, Error)]
pub enum LogError {
    #[error("Request validation failed")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Onsen log {0} not found")]
    NotFound(Uuid),

    #[error(transparent)]
    Forbidden(#[from] Forbidden),

    #[error("{0}")]
    UnsupportedFormat(String),

    #[error("Export failed: {0}")]
    Export(String),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl From<LogError> for ApiError {
    fn from(err: LogError) -> Self {
        match err {
            LogError::Validation(errors) => ApiError::from(errors),
            LogError::NotFound(id) => ApiError::NotFound {
                resource: "Onsen log".to_string(),
                id: id.to_string(),
            },
            LogError::Forbidden(_) => {
                ApiError::Forbidden("You do not have access to this onsen log".to_string())
            }
            LogError::UnsupportedFormat(message) => ApiError::validation(message),
            LogError::Export(message) => ApiError::Internal(message),
            LogError::Storage(err) => ApiError::from(err),
        }
    }
}

impl IntoResponse for LogError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}
