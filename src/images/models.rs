use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Stored image attached to a log entry
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct LogImage {
    pub id: Uuid,
    pub log_id: Uuid,
    pub user_id: Uuid,
    pub url: String,
    pub content_type: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Image as returned to clients
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ImageResponse {
    pub id: Uuid,
    pub onsen_log_id: Uuid,
    pub url: String,
    pub content_type: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<LogImage> for ImageResponse {
    fn from(image: LogImage) -> Self {
        Self {
            id: image.id,
            onsen_log_id: image.log_id,
            url: image.url,
            content_type: image.content_type,
            description: image.description,
            created_at: image.created_at,
            updated_at: image.updated_at,
        }
    }
}

/// Raw upload handed from the HTTP layer to the image service
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub content_type: String,
    pub description: String,
}

/// Outcome of an insert guarded by the per-entry image cap
#[derive(Debug, Clone, PartialEq)]
pub enum CappedInsert {
    Inserted(LogImage),
    AtCapacity,
}
