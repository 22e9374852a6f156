use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::{str::FromStr, time::Duration};

/// Type alias for the PostgreSQL connection pool
pub type DbPool = PgPool;

/// Creates and configures a PostgreSQL connection pool
///
/// Every connection carries a server-side `statement_timeout`, and acquiring a
/// connection is bounded, so a slow backend cannot hold a request forever.
///
/// # Arguments
/// * `database_url` - PostgreSQL connection string
/// * `statement_timeout` - Upper bound for any single statement
pub async fn create_pool(
    database_url: &str,
    statement_timeout: Duration,
) -> Result<DbPool, sqlx::Error> {
    tracing::debug!("Creating database connection pool");

    let options = PgConnectOptions::from_str(database_url)?.options([(
        "statement_timeout",
        statement_timeout.as_millis().to_string(),
    )]);

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(3))
        .connect_with(options)
        .await?;

    tracing::info!("Database connection pool created successfully");
    Ok(pool)
}

/// Apply pending migrations from `./migrations`
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}
