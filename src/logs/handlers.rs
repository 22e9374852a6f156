// HTTP handlers for onsen log endpoints

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::auth::middleware::AuthenticatedUser;
use crate::logs::{
    error::LogError,
    models::{LogEntry, LogEntryResponse, LogListResponse, LogRequest},
    query::{FilterParams, ListParams, LogFilter, Page},
};
#[allow(unused_imports)] // referenced by name in #[utoipa::path] responses
use crate::error::ErrorResponse;
use crate::AppState;

/// Query parameters for export
#[derive(Debug, Deserialize, IntoParams)]
pub struct ExportParams {
    /// `json` (default) or `csv`
    pub format: Option<String>,
}

/// Handler for POST /api/v1/onsen_logs
#[utoipa::path(
    post,
    path = "/api/v1/onsen_logs",
    request_body = LogRequest,
    responses(
        (status = 201, description = "Onsen log created", body = LogEntry),
        (status = 400, description = "Invalid input data", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "onsen_logs"
)]
pub async fn create_log_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<LogRequest>,
) -> Result<(StatusCode, Json<LogEntry>), LogError> {
    tracing::debug!("Creating onsen log {} for user {}", request.name, user.user_id);
    let entry = state.logs.create_log(user.user_id, request).await?;

    Ok((StatusCode::CREATED, Json(entry)))
}

/// Handler for GET /api/v1/onsen_logs
/// Lists the caller's logs, most recent visit first
#[utoipa::path(
    get,
    path = "/api/v1/onsen_logs",
    params(ListParams),
    responses(
        (status = 200, description = "One page of onsen logs", body = LogListResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "onsen_logs"
)]
pub async fn list_logs_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<ListParams>,
) -> Result<Json<LogListResponse>, LogError> {
    let page = Page::from(&params);
    let response = state.logs.list_logs(user.user_id, page).await?;

    tracing::debug!(
        "Listed {} of {} onsen logs for user {}",
        response.onsen_logs.len(),
        response.total_count,
        user.user_id
    );
    Ok(Json(response))
}

/// Handler for GET /api/v1/onsen_logs/filter
#[utoipa::path(
    get,
    path = "/api/v1/onsen_logs/filter",
    params(FilterParams),
    responses(
        (status = 200, description = "One page of matching onsen logs", body = LogListResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "onsen_logs"
)]
pub async fn filter_logs_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<FilterParams>,
) -> Result<Json<LogListResponse>, LogError> {
    tracing::debug!("Filtering onsen logs with query parameters: {:?}", params);

    let filter = LogFilter::from(&params);
    let page = Page::from(&params);
    let response = state.logs.filter_logs(user.user_id, filter, page).await?;

    Ok(Json(response))
}

/// Handler for GET /api/v1/onsen_logs/export
/// Downloads every log of the caller as JSON or CSV
#[utoipa::path(
    get,
    path = "/api/v1/onsen_logs/export",
    params(ExportParams),
    responses(
        (status = 200, description = "Export file", content_type = "application/octet-stream"),
        (status = 400, description = "Unsupported format", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "onsen_logs"
)]
pub async fn export_logs_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(params): Query<ExportParams>,
) -> Result<Response, LogError> {
    let format = params.format.as_deref().unwrap_or("json");
    let (format, body) = state.logs.export_logs(user.user_id, format).await?;

    let headers = [
        (header::CONTENT_TYPE, format.content_type().to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", format.file_name()),
        ),
    ];
    Ok((headers, body).into_response())
}

/// Handler for GET /api/v1/onsen_logs/:id
#[utoipa::path(
    get,
    path = "/api/v1/onsen_logs/{id}",
    params(
        ("id" = Uuid, Path, description = "Onsen log ID")
    ),
    responses(
        (status = 200, description = "Onsen log with its images", body = LogEntryResponse),
        (status = 403, description = "Owned by another user", body = ErrorResponse),
        (status = 404, description = "Onsen log not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "onsen_logs"
)]
pub async fn get_log_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<LogEntryResponse>, LogError> {
    let response = state.logs.get_log(user.user_id, id).await?;
    Ok(Json(response))
}

/// Handler for PUT /api/v1/onsen_logs/:id
#[utoipa::path(
    put,
    path = "/api/v1/onsen_logs/{id}",
    params(
        ("id" = Uuid, Path, description = "Onsen log ID")
    ),
    request_body = LogRequest,
    responses(
        (status = 200, description = "Onsen log updated", body = LogEntry),
        (status = 400, description = "Invalid input data", body = ErrorResponse),
        (status = 403, description = "Owned by another user", body = ErrorResponse),
        (status = 404, description = "Onsen log not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "onsen_logs"
)]
pub async fn update_log_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<LogRequest>,
) -> Result<Json<LogEntry>, LogError> {
    let entry = state.logs.update_log(user.user_id, id, request).await?;
    Ok(Json(entry))
}

/// Handler for DELETE /api/v1/onsen_logs/:id
/// Deletes the log together with its images
#[utoipa::path(
    delete,
    path = "/api/v1/onsen_logs/{id}",
    params(
        ("id" = Uuid, Path, description = "Onsen log ID")
    ),
    responses(
        (status = 204, description = "Onsen log deleted"),
        (status = 403, description = "Owned by another user", body = ErrorResponse),
        (status = 404, description = "Onsen log not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "onsen_logs"
)]
pub async fn delete_log_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, LogError> {
    state.logs.delete_log(user.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
