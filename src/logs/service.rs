use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::error::StoreError;
use crate::images::{models::ImageResponse, repository::ImageRepository, storage::ImageStorage};
use crate::logs::{
    error::LogError,
    export::ExportFormat,
    models::{LogEntry, LogEntryResponse, LogListResponse, LogRequest},
    ownership::ensure_owned,
    query::{LogFilter, LogQuery, Page},
    repository::LogRepository,
};

/// Service layer for log entry business logic
///
/// Every operation takes the caller's id from the verified token and scopes
/// reads and writes to it.
#[derive(Clone)]
pub struct LogService {
    logs: Arc<dyn LogRepository>,
    images: Arc<dyn ImageRepository>,
    storage: Arc<dyn ImageStorage>,
}

impl LogService {
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

    /// Fetch an entry and check it belongs to `caller`
    async fn owned_entry(&self, caller: Uuid, id: Uuid) -> Result<LogEntry, LogError> {
        let entry = self
            .logs
            .find_by_id(id)
            .await?
            .ok_or(LogError::NotFound(id))?;
        ensure_owned(&entry, caller)?;
        Ok(entry)
    }

    pub async fn create_log(&self, caller: Uuid, request: LogRequest) -> Result<LogEntry, LogError> {
        let draft = request.into_draft()?;
        let entry = self.logs.create(&LogEntry::new(caller, draft)).await?;

        info!("Created onsen log {} for user {}", entry.id, caller);
        Ok(entry)
    }

    /// Single entry with its images
    pub async fn get_log(&self, caller: Uuid, id: Uuid) -> Result<LogEntryResponse, LogError> {
        let entry = self.owned_entry(caller, id).await?;
        let images = self
            .images
            .find_by_log(id)
            .await?
            .into_iter()
            .map(ImageResponse::from)
            .collect();

        Ok(LogEntryResponse { entry, images })
    }

    /// Owner-scoped search returning one page and the full match count
    pub async fn search(
        &self,
        caller: Uuid,
        filter: LogFilter,
        page: Page,
    ) -> Result<(Vec<LogEntry>, i64), LogError> {
        let query = LogQuery::new(caller, filter);
        Ok(self.logs.search(&query, page).await?)
    }

    pub async fn list_logs(&self, caller: Uuid, page: Page) -> Result<LogListResponse, LogError> {
        self.filter_logs(caller, LogFilter::default(), page).await
    }

    pub async fn filter_logs(
        &self,
        caller: Uuid,
        filter: LogFilter,
        page: Page,
    ) -> Result<LogListResponse, LogError> {
        let (onsen_logs, total_count) = self.search(caller, filter, page).await?;

        Ok(LogListResponse {
            onsen_logs,
            total_count,
            page: page.page,
            limit: page.limit,
            total_pages: page.total_pages(total_count),
        })
    }

    /// Replace the mutable fields of an entry the caller owns
    ///
    /// 1. Validates the request
    /// 2. Fetches the entry and verifies ownership
    /// 3. Writes the new field values, keeping id and owner
    pub async fn update_log(
        &self,
        caller: Uuid,
        id: Uuid,
        request: LogRequest,
    ) -> Result<LogEntry, LogError> {
        let draft = request.into_draft()?;
        let mut entry = self.owned_entry(caller, id).await?;

        entry.apply(draft);
        let updated = self.logs.update(&entry).await.map_err(|err| match err {
            StoreError::NotFound => LogError::NotFound(id),
            other => LogError::Storage(other),
        })?;

        info!("Updated onsen log {} for user {}", id, caller);
        Ok(updated)
    }

    /// Delete an entry together with its image records and stored files
    pub async fn delete_log(&self, caller: Uuid, id: Uuid) -> Result<(), LogError> {
        self.owned_entry(caller, id).await?;

        let images = self.images.find_by_log(id).await?;
        self.remove_blobs(images.iter().map(|i| i.url.as_str())).await;
        self.images.delete_by_log(id).await?;

        self.logs.delete(id, caller).await.map_err(|err| match err {
            StoreError::NotFound => LogError::NotFound(id),
            other => LogError::Storage(other),
        })?;

        info!("Deleted onsen log {} ({} images) for user {}", id, images.len(), caller);
        Ok(())
    }

    /// All of the caller's entries rendered as `format` (`json` or `csv`)
    pub async fn export_logs(
        &self,
        caller: Uuid,
        format: &str,
    ) -> Result<(ExportFormat, Vec<u8>), LogError> {
        let format: ExportFormat = format.parse().map_err(LogError::UnsupportedFormat)?;
        let entries = self.logs.find_all(&LogQuery::all(caller)).await?;
        let body = format
            .render(&entries)
            .map_err(|e| LogError::Export(e.to_string()))?;

        info!("Exported {} onsen logs for user {}", entries.len(), caller);
        Ok((format, body))
    }

    /// Remove every entry and image belonging to `owner`
    pub async fn purge_owner(&self, owner: Uuid) -> Result<(), LogError> {
        let images = self.images.find_by_owner(owner).await?;
        self.remove_blobs(images.iter().map(|i| i.url.as_str())).await;
        self.images.delete_by_owner(owner).await?;
        let removed = self.logs.delete_all_by_owner(owner).await?;

        info!("Purged {} onsen logs for user {}", removed, owner);
        Ok(())
    }

    // Best effort: failures are logged and skipped
    async fn remove_blobs<'a>(&self, urls: impl Iterator<Item = &'a str>) {
        for url in urls {
            if let Err(err) = self.storage.delete(url).await {
                warn!("Failed to delete stored image {}: {}", url, err);
            }
        }
    }
}
