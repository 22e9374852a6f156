// Yuroku API: personal onsen log service
// Router, shared state and OpenAPI document; startup lives in main.rs

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod images;
pub mod logs;
pub mod validation;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi, ToSchema,
};
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use auth::{
    handlers as auth_handlers,
    middleware::{optional_auth, require_auth, MaybeUser},
    AuthService, TokenService,
};
use config::AppConfig;
use images::{handlers as image_handlers, storage::URL_PREFIX, ImageService};
use logs::{handlers as log_handlers, LogService};

/// Multipart bodies carry the image plus form overhead
const MAX_UPLOAD_BODY: usize = images::service::MAX_IMAGE_BYTES + 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub logs: LogService,
    pub images: ImageService,
    pub tokens: Arc<TokenService>,
}

/// Health check body
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
}

/// Handler for GET /api/v1/health
/// Works with or without a token and reports which case applied
#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_handler(MaybeUser(user): MaybeUser) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        authenticated: user.is_some(),
        user_id: user.map(|u| u.user_id),
    })
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    paths(
        auth_handlers::register_handler,
        auth_handlers::login_handler,
        auth_handlers::refresh_handler,
        auth_handlers::logout_handler,
        auth_handlers::profile_handler,
        auth_handlers::update_profile_handler,
        auth_handlers::change_password_handler,
        auth_handlers::delete_account_handler,
        log_handlers::create_log_handler,
        log_handlers::list_logs_handler,
        log_handlers::filter_logs_handler,
        log_handlers::export_logs_handler,
        log_handlers::get_log_handler,
        log_handlers::update_log_handler,
        log_handlers::delete_log_handler,
        image_handlers::upload_image_handler,
        image_handlers::list_images_handler,
        image_handlers::delete_image_handler,
        health_handler,
    ),
    components(
        schemas(
            auth::models::RegisterRequest,
            auth::models::LoginRequest,
            auth::models::RefreshRequest,
            auth::models::UpdateProfileRequest,
            auth::models::ChangePasswordRequest,
            auth::models::DeleteAccountRequest,
            auth::models::AuthResponse,
            auth::models::UserResponse,
            auth::models::MessageResponse,
            auth::token::TokenPair,
            logs::models::LogEntry,
            logs::models::LogRequest,
            logs::models::LogEntryResponse,
            logs::models::LogListResponse,
            logs::models::SpringType,
            logs::models::Feature,
            images::models::ImageResponse,
            image_handlers::ImageUploadForm,
            error::ErrorResponse,
            HealthResponse,
        )
    ),
    tags(
        (name = "auth", description = "Registration, login, tokens and profile"),
        (name = "onsen_logs", description = "Owner-scoped onsen log management"),
        (name = "images", description = "Photos attached to onsen logs"),
        (name = "health", description = "Service health")
    ),
    info(
        title = "Yuroku API",
        version = "1.0.0",
        description = "RESTful API for keeping a private log of onsen visits"
    )
)]
pub struct ApiDoc;

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let allow_origin = match origin {
        None => AllowOrigin::from(Any),
        Some(origin) => match HeaderValue::from_str(origin) {
            Ok(value) => AllowOrigin::exact(value),
            Err(_) => {
                tracing::warn!(
                    "CORS_ORIGIN {} is not a valid header value; cross-origin requests disabled",
                    origin
                );
                AllowOrigin::list(Vec::<HeaderValue>::new())
            }
        },
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Creates and configures the application router
///
/// Everything under `/api/v1` except registration, login, refresh and health
/// sits behind `require_auth`; health uses the optional variant.
pub fn create_router(state: AppState, config: &AppConfig) -> Router {
    let public = Router::new()
        .route("/auth/register", post(auth_handlers::register_handler))
        .route("/auth/login", post(auth_handlers::login_handler))
        .route("/auth/refresh", post(auth_handlers::refresh_handler));

    let protected = Router::new()
        .route("/auth/logout", post(auth_handlers::logout_handler))
        .route(
            "/auth/profile",
            get(auth_handlers::profile_handler)
                .put(auth_handlers::update_profile_handler)
                .delete(auth_handlers::delete_account_handler),
        )
        .route(
            "/auth/profile/password",
            put(auth_handlers::change_password_handler),
        )
        .route(
            "/onsen_logs",
            post(log_handlers::create_log_handler).get(log_handlers::list_logs_handler),
        )
        .route("/onsen_logs/filter", get(log_handlers::filter_logs_handler))
        .route("/onsen_logs/export", get(log_handlers::export_logs_handler))
        .route(
            "/onsen_logs/:id",
            get(log_handlers::get_log_handler)
                .put(log_handlers::update_log_handler)
                .delete(log_handlers::delete_log_handler),
        )
        .route(
            "/onsen_logs/:id/images",
            post(image_handlers::upload_image_handler)
                .get(image_handlers::list_images_handler)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY)),
        )
        .route(
            "/onsen_logs/:id/images/:image_id",
            delete(image_handlers::delete_image_handler),
        )
        .route_layer(middleware::from_fn_with_state(
            state.tokens.clone(),
            require_auth,
        ));

    let health = Router::new()
        .route("/health", get(health_handler))
        .route_layer(middleware::from_fn_with_state(
            state.tokens.clone(),
            optional_auth,
        ));

    let api = Router::new().merge(public).merge(protected).merge(health);

    Router::new()
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // API routes
        .nest("/api/v1", api)
        // Uploaded images
        .nest_service(URL_PREFIX, ServeDir::new(&config.upload_dir))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(config.cors_origin.as_deref()))
                .layer(TimeoutLayer::new(config.request_timeout)),
        )
        .with_state(state)
}

#[cfg(test)]
mod test_support;
