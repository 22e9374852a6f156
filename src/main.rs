use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use yuroku_api::{
    auth::{password::PasswordService, repository::PgUserRepository, AuthService, TokenService},
    config::AppConfig,
    create_router, db,
    images::{repository::PgImageRepository, ImageService, LocalFileStorage},
    logs::{repository::PgLogRepository, LogService},
    AppState,
};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize tracing subscriber; RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Yuroku API - Starting...");

    let config = AppConfig::from_env().expect("Invalid configuration");

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = db::create_pool(&config.database_url, config.db_statement_timeout)
        .await
        .expect("Failed to create database pool");

    // Run SQLx migrations on startup
    tracing::info!("Running database migrations...");
    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run database migrations");

    // Wire adapters into services
    let tokens = Arc::new(TokenService::new(
        &config.jwt_secret,
        config.access_token_ttl.as_secs() as i64,
        config.refresh_token_ttl.as_secs() as i64,
    ));
    let users = Arc::new(PgUserRepository::new(db_pool.clone()));
    let logs = Arc::new(PgLogRepository::new(db_pool.clone()));
    let images = Arc::new(PgImageRepository::new(db_pool));
    let storage = Arc::new(LocalFileStorage::new(config.upload_dir.clone()));

    let log_service = LogService::new(logs.clone(), images.clone(), storage.clone());
    let image_service = ImageService::new(logs, images, storage);
    let auth_service = AuthService::new(
        users,
        Arc::new(PasswordService::default()),
        tokens.clone(),
        log_service.clone(),
    );

    let state = AppState {
        auth: auth_service,
        logs: log_service,
        images: image_service,
        tokens,
    };

    // Create the application router
    let app = create_router(state, &config);

    // Start the Axum server
    let addr = config.bind_address();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Yuroku API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app).await.expect("Server error");
}
