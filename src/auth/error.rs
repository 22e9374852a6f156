// Authentication and authorization error types

use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::error::{ApiError, StoreError};

/// Authentication and authorization error types
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Request validation failed")]
    InvalidFields(#[from] validator::ValidationErrors),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Missing authentication token")]
    MissingToken,

    #[error("Invalid authorization header format")]
    InvalidAuthHeader,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid token signature")]
    BadSignature,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Token type not accepted for this operation")]
    WrongTokenType,

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("User not found")]
    UserNotFound,

    #[error("Password hashing error")]
    PasswordHash,

    #[error("Token generation error: {0}")]
    TokenGeneration(String),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(message) => ApiError::validation(message),
            AuthError::InvalidFields(errors) => ApiError::from(errors),
            AuthError::InvalidCredentials => ApiError::Unauthorized {
                code: "AUTHENTICATION_ERROR",
                message: "Invalid email or password".to_string(),
            },
            AuthError::MissingToken => ApiError::Unauthorized {
                code: "MISSING_TOKEN",
                message: "Authorization header is required".to_string(),
            },
            AuthError::InvalidAuthHeader => ApiError::Unauthorized {
                code: "INVALID_TOKEN_FORMAT",
                message: "Authorization header must be in format: Bearer <token>".to_string(),
            },
            // Signature problems are reported like any other bad token
            AuthError::InvalidToken | AuthError::BadSignature | AuthError::WrongTokenType => {
                ApiError::Unauthorized {
                    code: "INVALID_TOKEN",
                    message: "Invalid token".to_string(),
                }
            }
            AuthError::ExpiredToken => ApiError::Unauthorized {
                code: "TOKEN_EXPIRED",
                message: "Token has expired".to_string(),
            },
            AuthError::EmailAlreadyExists => ApiError::Conflict {
                message: "Email already exists".to_string(),
            },
            AuthError::UserNotFound => ApiError::NotFound {
                resource: "User".to_string(),
                id: "current".to_string(),
            },
            AuthError::PasswordHash => ApiError::Internal("password hashing failed".to_string()),
            AuthError::TokenGeneration(msg) => ApiError::Internal(msg),
            AuthError::Storage(err) => ApiError::from(err),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}
