// Error handling module for the Yuroku API
// Provides the shared storage error and the HTTP error envelope every module error renders into

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use tracing::{debug, error, warn};

/// Failure reported by a storage collaborator (credential store, record
/// repository, image store).
///
/// Adapters map their backend errors into these variants so services can
/// tell "not found" apart from "backend unavailable".
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("unique constraint violated: {0}")]
    Conflict(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StoreError::Conflict(db_err.message().to_string())
            }
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            StoreError::NotFound
        } else {
            StoreError::Backend(err.to_string())
        }
    }
}

/// Top-level error rendered to clients
///
/// Module errors (`AuthError`, `LogError`, `ImageError`) convert into this
/// type, which owns the status code, the stable machine-readable code and
/// the client-safe message.
#[derive(Debug)]
pub enum ApiError {
    /// Request validation failed (400)
    Validation {
        message: String,
        details: Option<serde_json::Value>,
    },

    /// Resource not found (404)
    NotFound { resource: String, id: String },

    /// Duplicate entity (409)
    Conflict { message: String },

    /// Missing, malformed, invalid or expired credentials (401)
    Unauthorized { code: &'static str, message: String },

    /// Valid identity acting on something it does not own (403)
    Forbidden(String),

    /// Per-parent capacity reached, e.g. image cap (409)
    CapacityExceeded(String),

    /// Storage backend failure (500), details logged but never returned
    Storage(String),

    /// Any other internal failure (500), details logged but never returned
    Internal(String),
}

/// Consistent error response structure
///
/// `error_code` is stable and machine-readable; `message` is for humans.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error_code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
    /// ISO 8601 timestamp of when the error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    fn new(error_code: &str, message: String, details: Option<serde_json::Value>) -> Self {
        Self {
            error_code: error_code.to_string(),
            message,
            details,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = self.to_error_response();
        (status, Json(error_response)).into_response()
    }
}

impl ApiError {
    /// Convert ApiError to HTTP status code and ErrorResponse
    ///
    /// Logging level follows severity: `error!` for 500s, `warn!` for
    /// security-relevant client errors, `debug!` for expected ones.
    fn to_error_response(&self) -> (StatusCode, ErrorResponse) {
        match self {
            ApiError::Validation { message, details } => {
                debug!("Validation error: {}", message);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::new("VALIDATION_ERROR", message.clone(), details.clone()),
                )
            }
            ApiError::NotFound { resource, id } => {
                debug!("Resource not found: {} with id {}", resource, id);
                (
                    StatusCode::NOT_FOUND,
                    ErrorResponse::new(
                        "NOT_FOUND",
                        format!("{} with id {} not found", resource, id),
                        None,
                    ),
                )
            }
            ApiError::Conflict { message } => {
                warn!("Conflict error: {}", message);
                (
                    StatusCode::CONFLICT,
                    ErrorResponse::new("DUPLICATE_ENTITY", message.clone(), None),
                )
            }
            ApiError::Unauthorized { code, message } => {
                warn!("Unauthorized access attempt: {}", code);
                (
                    StatusCode::UNAUTHORIZED,
                    ErrorResponse::new(code, message.clone(), None),
                )
            }
            ApiError::Forbidden(message) => {
                warn!("Forbidden access attempt: {}", message);
                (
                    StatusCode::FORBIDDEN,
                    ErrorResponse::new("FORBIDDEN", message.clone(), None),
                )
            }
            ApiError::CapacityExceeded(message) => {
                debug!("Capacity exceeded: {}", message);
                (
                    StatusCode::CONFLICT,
                    ErrorResponse::new("CAPACITY_EXCEEDED", message.clone(), None),
                )
            }
            ApiError::Storage(internal) => {
                error!("Storage error: {}", internal);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("STORAGE_ERROR", "A storage error occurred".to_string(), None),
                )
            }
            ApiError::Internal(internal) => {
                error!("Internal error: {}", internal);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new(
                        "INTERNAL_ERROR",
                        "An internal server error occurred".to_string(),
                        None,
                    ),
                )
            }
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::CapacityExceeded(_) => StatusCode::CONFLICT,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
            details: None,
        }
    }
}

/// Convert validator errors to ApiError, keeping field-level details
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::Validation {
            message: "Request validation failed".to_string(),
            details: Some(serde_json::to_value(&errors).unwrap_or(serde_json::json!({}))),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::validation("bad").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::Unauthorized { code: "INVALID_TOKEN", message: "x".into() }.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::Forbidden("x".into()).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::CapacityExceeded("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::Storage("pool timed out".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_storage_details_are_not_exposed() {
        let (_, body) = ApiError::Storage("connection refused to 10.0.0.5".into()).to_error_response();
        assert_eq!(body.error_code, "STORAGE_ERROR");
        assert!(!body.message.contains("10.0.0.5"));
    }

    #[test]
    fn test_unauthorized_keeps_specific_code() {
        let (_, body) = ApiError::Unauthorized {
            code: "TOKEN_EXPIRED",
            message: "Token has expired".into(),
        }
        .to_error_response();
        assert_eq!(body.error_code, "TOKEN_EXPIRED");
        assert_eq!(body.message, "Token has expired");
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        assert!(matches!(StoreError::from(sqlx::Error::RowNotFound), StoreError::NotFound));
    }
}
