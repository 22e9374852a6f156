// Image record persistence: port and PostgreSQL adapter

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StoreError;
use crate::images::models::{CappedInsert, LogImage};

/// Persistence port for image records
#[async_trait]
pub trait ImageRepository: Send + Sync {
    /// Insert only while the parent entry has fewer than `max` images
    ///
    /// Count and insert happen as one atomic step per parent entry, so
    /// concurrent uploads can never push the count past `max`.
    async fn insert_capped(&self, image: &LogImage, max: i64) -> Result<CappedInsert, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<LogImage>, StoreError>;

    async fn find_by_log(&self, log_id: Uuid) -> Result<Vec<LogImage>, StoreError>;

    async fn count_by_log(&self, log_id: Uuid) -> Result<i64, StoreError>;

    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;

    async fn delete_by_log(&self, log_id: Uuid) -> Result<u64, StoreError>;

    async fn find_by_owner(&self, owner: Uuid) -> Result<Vec<LogImage>, StoreError>;

    async fn delete_by_owner(&self, owner: Uuid) -> Result<u64, StoreError>;
}

const IMAGE_COLUMNS: &str =
    "id, log_id, user_id, url, content_type, description, created_at, updated_at";

/// Image repository backed by PostgreSQL
#[derive(Clone)]
pub struct PgImageRepository {
    pool: PgPool,
}

impl PgImageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ImageRepository for PgImageRepository {
    async fn insert_capped(&self, image: &LogImage, max: i64) -> Result<CappedInsert, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Row lock on the parent serializes uploads to the same entry
        let parent: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM log_entries WHERE id = $1 FOR UPDATE")
                .bind(image.log_id)
                .fetch_optional(&mut *tx)
                .await?;
        if parent.is_none() {
            return Err(StoreError::NotFound);
        }

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM log_images WHERE log_id = $1")
            .bind(image.log_id)
            .fetch_one(&mut *tx)
            .await?;
        if count >= max {
            tx.rollback().await?;
            return Ok(CappedInsert::AtCapacity);
        }

        let inserted = sqlx::query_as::<_, LogImage>(&format!(
            "INSERT INTO log_images
                 (id, log_id, user_id, url, content_type, description, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {IMAGE_COLUMNS}"
        ))
        .bind(image.id)
        .bind(image.log_id)
        .bind(image.user_id)
        .bind(&image.url)
        .bind(&image.content_type)
        .bind(&image.description)
        .bind(image.created_at)
        .bind(image.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(CappedInsert::Inserted(inserted))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<LogImage>, StoreError> {
        let image = sqlx::query_as::<_, LogImage>(&format!(
            "SELECT {IMAGE_COLUMNS} FROM log_images WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(image)
    }

    async fn find_by_log(&self, log_id: Uuid) -> Result<Vec<LogImage>, StoreError> {
        let images = sqlx::query_as::<_, LogImage>(&format!(
            "SELECT {IMAGE_COLUMNS} FROM log_images WHERE log_id = $1 ORDER BY created_at, id"
        ))
        .bind(log_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(images)
    }

    async fn count_by_log(&self, log_id: Uuid) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM log_images WHERE log_id = $1")
            .bind(log_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM log_images WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_by_log(&self, log_id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM log_images WHERE log_id = $1")
            .bind(log_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn find_by_owner(&self, owner: Uuid) -> Result<Vec<LogImage>, StoreError> {
        let images = sqlx::query_as::<_, LogImage>(&format!(
            "SELECT {IMAGE_COLUMNS} FROM log_images WHERE user_id = $1"
        ))
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        Ok(images)
    }

    async fn delete_by_owner(&self, owner: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM log_images WHERE user_id = $1")
            .bind(owner)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
