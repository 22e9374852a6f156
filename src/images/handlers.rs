// HTTP handlers for log entry images

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::auth::middleware::AuthenticatedUser;
use crate::images::{
    error::ImageError,
    models::{ImageResponse, ImageUpload},
};
#[allow(unused_imports)] // referenced by name in #[utoipa::path] responses
use crate::error::ErrorResponse;
use crate::AppState;

/// Multipart form accepted by the upload endpoint (documentation only)
#[derive(utoipa::ToSchema)]
#[allow(dead_code)]
pub struct ImageUploadForm {
    /// jpeg, png, gif or webp, at most 5 MiB
    #[schema(value_type = String, format = Binary)]
    image: Vec<u8>,
    description: Option<String>,
}

/// Pull the `image` and optional `description` fields out of the form
async fn read_upload(mut multipart: Multipart) -> Result<ImageUpload, ImageError> {
    let mut image: Option<(Vec<u8>, String, String)> = None;
    let mut description = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ImageError::Validation(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ImageError::Validation(e.body_text()))?;
                image = Some((bytes.to_vec(), filename, content_type));
            }
            "description" => {
                description = field
                    .text()
                    .await
                    .map_err(|e| ImageError::Validation(e.body_text()))?;
            }
            other => tracing::debug!("Ignoring multipart field {}", other),
        }
    }

    let (bytes, filename, content_type) =
        image.ok_or_else(|| ImageError::Validation("Field 'image' is required".to_string()))?;

    Ok(ImageUpload {
        bytes,
        filename,
        content_type,
        description: description.trim().to_string(),
    })
}

/// Handler for POST /api/v1/onsen_logs/:id/images
#[utoipa::path(
    post,
    path = "/api/v1/onsen_logs/{id}/images",
    params(
        ("id" = Uuid, Path, description = "Onsen log ID")
    ),
    request_body(content = ImageUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Image attached", body = ImageResponse),
        (status = 400, description = "Missing or unsupported image", body = ErrorResponse),
        (status = 403, description = "Owned by another user", body = ErrorResponse),
        (status = 404, description = "Onsen log not found", body = ErrorResponse),
        (status = 409, description = "Onsen log already has 3 images", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "images"
)]
pub async fn upload_image_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(log_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ImageResponse>), ImageError> {
    let upload = read_upload(multipart).await?;
    let image = state.images.upload(user.user_id, log_id, upload).await?;

    Ok((StatusCode::CREATED, Json(image.into())))
}

/// Handler for GET /api/v1/onsen_logs/:id/images
#[utoipa::path(
    get,
    path = "/api/v1/onsen_logs/{id}/images",
    params(
        ("id" = Uuid, Path, description = "Onsen log ID")
    ),
    responses(
        (status = 200, description = "Images of the onsen log", body = Vec<ImageResponse>),
        (status = 403, description = "Owned by another user", body = ErrorResponse),
        (status = 404, description = "Onsen log not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "images"
)]
pub async fn list_images_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(log_id): Path<Uuid>,
) -> Result<Json<Vec<ImageResponse>>, ImageError> {
    let images = state.images.list(user.user_id, log_id).await?;
    Ok(Json(images.into_iter().map(ImageResponse::from).collect()))
}

/// Handler for DELETE /api/v1/onsen_logs/:id/images/:image_id
#[utoipa::path(
    delete,
    path = "/api/v1/onsen_logs/{id}/images/{image_id}",
    params(
        ("id" = Uuid, Path, description = "Onsen log ID"),
        ("image_id" = Uuid, Path, description = "Image ID")
    ),
    responses(
        (status = 204, description = "Image deleted"),
        (status = 403, description = "Owned by another user", body = ErrorResponse),
        (status = 404, description = "Onsen log or image not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "images"
)]
pub async fn delete_image_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path((log_id, image_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ImageError> {
    state.images.delete(user.user_id, log_id, image_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
