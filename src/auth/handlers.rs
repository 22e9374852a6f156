// HTTP handlers for authentication endpoints

use axum::{extract::State, http::StatusCode, Json};
use validator::Validate;

use crate::auth::{
    error::AuthError,
    middleware::AuthenticatedUser,
    models::{
        AuthResponse, ChangePasswordRequest, DeleteAccountRequest, LoginRequest, MessageResponse,
        RefreshRequest, RegisterRequest, UpdateProfileRequest, UserResponse,
    },
};
#[allow(unused_imports)] // referenced by name in #[utoipa::path] responses
use crate::error::ErrorResponse;
use crate::AppState;

/// Handler for POST /api/v1/auth/register
/// Creates an account and signs the new user in
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = AuthResponse),
        (status = 400, description = "Invalid input data", body = ErrorResponse),
        (status = 409, description = "Email already exists", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn register_handler(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AuthError> {
    let user = state.auth.register(request).await?;
    let response = state.auth.issue_token_pair(user)?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Handler for POST /api/v1/auth/login
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 400, description = "Invalid input data", body = ErrorResponse),
        (status = 401, description = "Invalid email or password", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    request.validate()?;
    let response = state.auth.login(&request.email, &request.password).await?;

    Ok(Json(response))
}

/// Handler for POST /api/v1/auth/refresh
/// Exchanges a refresh token for a new token pair
#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Tokens refreshed", body = AuthResponse),
        (status = 401, description = "Invalid or expired refresh token", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn refresh_handler(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    let response = state.auth.refresh(&request.refresh_token).await?;
    Ok(Json(response))
}

/// Handler for POST /api/v1/auth/logout
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn logout_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Json<MessageResponse> {
    state.auth.logout(user.user_id);
    Json(MessageResponse {
        message: "Logged out successfully".to_string(),
    })
}

/// Handler for GET /api/v1/auth/profile
#[utoipa::path(
    get,
    path = "/api/v1/auth/profile",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "User no longer exists", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn profile_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<UserResponse>, AuthError> {
    let user = state.auth.get_current_user(user.user_id).await?;
    Ok(Json(user.into()))
}

/// Handler for PUT /api/v1/auth/profile
#[utoipa::path(
    put,
    path = "/api/v1/auth/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Invalid input data", body = ErrorResponse),
        (status = 409, description = "Email already exists", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn update_profile_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AuthError> {
    let updated = state.auth.update_profile(user.user_id, request).await?;
    Ok(Json(updated.into()))
}

/// Handler for PUT /api/v1/auth/profile/password
#[utoipa::path(
    put,
    path = "/api/v1/auth/profile/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Invalid input data", body = ErrorResponse),
        (status = 401, description = "Current password is wrong", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn change_password_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, AuthError> {
    state.auth.change_password(user.user_id, request).await?;
    Ok(Json(MessageResponse {
        message: "Password changed successfully".to_string(),
    }))
}

/// Handler for DELETE /api/v1/auth/profile
/// Deletes the account with all of its log entries and images
#[utoipa::path(
    delete,
    path = "/api/v1/auth/profile",
    request_body = DeleteAccountRequest,
    responses(
        (status = 204, description = "Account deleted"),
        (status = 401, description = "Password is wrong", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn delete_account_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<DeleteAccountRequest>,
) -> Result<StatusCode, AuthError> {
    state.auth.delete_account(user.user_id, request).await?;
    Ok(StatusCode::NO_CONTENT)
}
