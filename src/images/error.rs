use axum::response::{IntoResponse, Response};
use thiserror::Error;
use uuid::Uuid;

use crate::error::{ApiError, StoreError};
use crate::logs::ownership::Forbidden;

/// Errors produced by image operations
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("{0}")]
    Validation(String),

    #[error("Onsen log {0} not found")]
    LogNotFound(Uuid),

    #[error("Image {0} not found")]
    NotFound(Uuid),

    #[error(transparent)]
    Forbidden(#[from] Forbidden),

    #[error("An onsen log can hold at most {0} images")]
    CapacityExceeded(i64),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl From<ImageError> for ApiError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::Validation(message) => ApiError::validation(message),
            ImageError::LogNotFound(id) => ApiError::NotFound {
                resource: "Onsen log".to_string(),
                id: id.to_string(),
            },
            ImageError::NotFound(id) => ApiError::NotFound {
                resource: "Image".to_string(),
                id: id.to_string(),
            },
            ImageError::Forbidden(_) => {
                ApiError::Forbidden("You do not have access to this onsen log".to_string())
            }
            err @ ImageError::CapacityExceeded(_) => ApiError::CapacityExceeded(err.to_string()),
            ImageError::Storage(err) => ApiError::from(err),
        }
    }
}

impl IntoResponse for ImageError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}
