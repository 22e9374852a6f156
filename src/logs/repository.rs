// Record repository: port and PostgreSQL adapter for log entries

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StoreError;
use crate::logs::models::{LogEntry, LogEntryRow};
use crate::logs::query::{LogQuery, Page};

/// Persistence port for log entries
#[async_trait]
pub trait LogRepository: Send + Sync {
    async fn create(&self, entry: &LogEntry) -> Result<LogEntry, StoreError>;

    /// Unscoped lookup; callers apply the ownership check
    async fn find_by_id(&self, id: Uuid) -> Result<Option<LogEntry>, StoreError>;

    /// Overwrite mutable fields of the row matching both id and owner
    async fn update(&self, entry: &LogEntry) -> Result<LogEntry, StoreError>;

    async fn delete(&self, id: Uuid, owner: Uuid) -> Result<(), StoreError>;

    async fn delete_all_by_owner(&self, owner: Uuid) -> Result<u64, StoreError>;

    /// One page of matches plus the size of the whole filtered set
    ///
    /// Both numbers come from the same snapshot and the same predicate.
    async fn search(&self, query: &LogQuery, page: Page)
        -> Result<(Vec<LogEntry>, i64), StoreError>;

    /// Every match in listing order
    async fn find_all(&self, query: &LogQuery) -> Result<Vec<LogEntry>, StoreError>;
}

const LOG_COLUMNS: &str = "id, user_id, name, location, spring_type, features, visit_date, \
     rating, comment, created_at, updated_at";

/// Log entry repository backed by PostgreSQL
#[derive(Clone)]
pub struct PgLogRepository {
    pool: PgPool,
}

impl PgLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn into_entries(rows: Vec<LogEntryRow>) -> Result<Vec<LogEntry>, StoreError> {
    rows.into_iter().map(LogEntry::try_from).collect()
}

#[async_trait]
impl LogRepository for PgLogRepository {
    async fn create(&self, entry: &LogEntry) -> Result<LogEntry, StoreError> {
        let row = sqlx::query_as::<_, LogEntryRow>(&format!(
            "INSERT INTO log_entries
                (id, user_id, name, location, spring_type, features, visit_date,
                 rating, comment, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING {LOG_COLUMNS}"
        ))
        .bind(entry.id)
        .bind(entry.user_id)
        .bind(&entry.name)
        .bind(&entry.location)
        .bind(entry.spring_type.as_str())
        .bind(entry.features_as_strings())
        .bind(entry.visit_date)
        .bind(entry.rating)
        .bind(&entry.comment)
        .bind(entry.created_at)
        .bind(entry.updated_at)
        .fetch_one(&self.pool)
        .await?;

        LogEntry::try_from(row)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<LogEntry>, StoreError> {
        let row = sqlx::query_as::<_, LogEntryRow>(&format!(
            "SELECT {LOG_COLUMNS} FROM log_entries WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(LogEntry::try_from).transpose()
    }

    async fn update(&self, entry: &LogEntry) -> Result<LogEntry, StoreError> {
        let row = sqlx::query_as::<_, LogEntryRow>(&format!(
            "UPDATE log_entries
             SET name = $3, location = $4, spring_type = $5, features = $6,
                 visit_date = $7, rating = $8, comment = $9, updated_at = $10
             WHERE id = $1 AND user_id = $2
             RETURNING {LOG_COLUMNS}"
        ))
        .bind(entry.id)
        .bind(entry.user_id)
        .bind(&entry.name)
        .bind(&entry.location)
        .bind(entry.spring_type.as_str())
        .bind(entry.features_as_strings())
        .bind(entry.visit_date)
        .bind(entry.rating)
        .bind(&entry.comment)
        .bind(entry.updated_at)
        .fetch_optional(&self.pool)
        .await?;

        row.map(LogEntry::try_from)
            .transpose()?
            .ok_or(StoreError::NotFound)
    }

    async fn delete(&self, id: Uuid, owner: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM log_entries WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_all_by_owner(&self, owner: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM log_entries WHERE user_id = $1")
            .bind(owner)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn search(
        &self,
        query: &LogQuery,
        page: Page,
    ) -> Result<(Vec<LogEntry>, i64), StoreError> {
        // Count and page read one snapshot so totals match the slice
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let mut count = query.count_query();
        let total: i64 = count.build_query_scalar().fetch_one(&mut *tx).await?;

        let mut select = query.page_query(page);
        let rows: Vec<LogEntryRow> = select.build_query_as().fetch_all(&mut *tx).await?;

        tx.commit().await?;

        tracing::debug!(
            "Search for owner {} returned {} of {} rows",
            query.owner(),
            rows.len(),
            total
        );
        Ok((into_entries(rows)?, total))
    }

    async fn find_all(&self, query: &LogQuery) -> Result<Vec<LogEntry>, StoreError> {
        let mut select = query.select_query();
        let rows: Vec<LogEntryRow> = select.build_query_as().fetch_all(&self.pool).await?;
        into_entries(rows)
    }
}
