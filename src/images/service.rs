use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::StoreError;
use crate::images::{
    error::ImageError,
    models::{CappedInsert, ImageUpload, LogImage},
    repository::ImageRepository,
    storage::ImageStorage,
};
use crate::logs::{models::LogEntry, ownership::ensure_owned, repository::LogRepository};

/// Maximum number of images attached to one log entry
pub const MAX_IMAGES_PER_LOG: i64 = 3;

/// Largest accepted upload
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

pub const ALLOWED_CONTENT_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Service layer for log entry images
#[derive(Clone)]
pub struct ImageService {
    logs: Arc<dyn LogRepository>,
    images: Arc<dyn ImageRepository>,
    storage: Arc<dyn ImageStorage>,
}

impl ImageService {
    pub fn new(
        logs: Arc<dyn LogRepository>,
        images: Arc<dyn ImageRepository>,
        storage: Arc<dyn ImageStorage>,
    ) -> Self {
        Self {
            logs,
            images,
            storage,
        }
    }

    async fn owned_log(&self, caller: Uuid, log_id: Uuid) -> Result<LogEntry, ImageError> {
        let entry = self
            .logs
            .find_by_id(log_id)
            .await?
            .ok_or(ImageError::LogNotFound(log_id))?;
        ensure_owned(&entry, caller)?;
        Ok(entry)
    }

    fn validate_upload(upload: &ImageUpload) -> Result<(), ImageError> {
        if upload.bytes.is_empty() {
            return Err(ImageError::Validation("Image file is empty".to_string()));
        }
        if upload.bytes.len() > MAX_IMAGE_BYTES {
            return Err(ImageError::Validation(format!(
                "Image must not exceed {} bytes",
                MAX_IMAGE_BYTES
            )));
        }
        if !ALLOWED_CONTENT_TYPES.contains(&upload.content_type.as_str()) {
            return Err(ImageError::Validation(format!(
                "Unsupported image type: {}",
                upload.content_type
            )));
        }
        if upload.description.chars().count() > 500 {
            return Err(ImageError::Validation(
                "Description must not exceed 500 characters".to_string(),
            ));
        }
        Ok(())
    }

    /// Attach an image to a log entry the caller owns
    ///
    /// This method:
    /// 1. Validates the upload and checks ownership of the entry
    /// 2. Rejects early when the entry is already full
    /// 3. Stores the bytes in the image store
    /// 4. Inserts the record only if the entry is still below the cap
    ///
    /// The stored file is removed again whenever step 4 does not insert.
    pub async fn upload(
        &self,
        caller: Uuid,
        log_id: Uuid,
        upload: ImageUpload,
    ) -> Result<LogImage, ImageError> {
        // 1. Validate and authorize
        Self::validate_upload(&upload)?;
        self.owned_log(caller, log_id).await?;

        // 2. Cheap pre-check; the conditional insert below is authoritative
        if self.images.count_by_log(log_id).await? >= MAX_IMAGES_PER_LOG {
            return Err(ImageError::CapacityExceeded(MAX_IMAGES_PER_LOG));
        }

        // 3. Store the bytes
        let url = self
            .storage
            .upload(&upload.bytes, &upload.filename, &upload.content_type)
            .await?;

        // 4. Capped insert
        let now = Utc::now();
        let image = LogImage {
            id: Uuid::new_v4(),
            log_id,
            user_id: caller,
            url,
            content_type: upload.content_type,
            description: upload.description,
            created_at: now,
            updated_at: now,
        };
        let outcome = self.images.insert_capped(&image, MAX_IMAGES_PER_LOG).await;

        let err = match outcome {
            Ok(CappedInsert::Inserted(image)) => {
                info!("Attached image {} to onsen log {}", image.id, log_id);
                return Ok(image);
            }
            Ok(CappedInsert::AtCapacity) => ImageError::CapacityExceeded(MAX_IMAGES_PER_LOG),
            Err(StoreError::NotFound) => ImageError::LogNotFound(log_id),
            Err(other) => ImageError::Storage(other),
        };

        if let Err(cleanup) = self.storage.delete(&image.url).await {
            warn!("Failed to remove orphaned upload {}: {}", image.url, cleanup);
        }
        Err(err)
    }

    pub async fn list(&self, caller: Uuid, log_id: Uuid) -> Result<Vec<LogImage>, ImageError> {
        self.owned_log(caller, log_id).await?;
        Ok(self.images.find_by_log(log_id).await?)
    }

    /// Remove the stored file, then the record
    pub async fn delete(&self, caller: Uuid, log_id: Uuid, image_id: Uuid) -> Result<(), ImageError> {
        self.owned_log(caller, log_id).await?;

        let image = self
            .images
            .find_by_id(image_id)
            .await?
            .filter(|image| image.log_id == log_id)
            .ok_or(ImageError::NotFound(image_id))?;
        ensure_owned(&image, caller)?;

        self.storage.delete(&image.url).await?;
        self.images.delete(image_id).await.map_err(|err| match err {
            StoreError::NotFound => ImageError::NotFound(image_id),
            other => ImageError::Storage(other),
        })?;

        info!("Deleted image {} from onsen log {}", image_id, log_id);
        Ok(())
    }
}
