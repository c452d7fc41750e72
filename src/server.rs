//! # Server Configuration
//!
//! This module contains the server setup and configuration for the Catalog
//! API.

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::auth_middleware;
use crate::config::AppConfig;
use crate::db;
use crate::handlers;
use crate::import::ImportRegistry;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    pub imports: Arc<ImportRegistry>,
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let max_upload_bytes = state.config.import.max_upload_bytes;

    let protected = Router::new()
        .route(
            "/items",
            get(handlers::items::list_items).post(handlers::items::create_item),
        )
        .route(
            "/items/{code}",
            get(handlers::items::get_item)
                .put(handlers::items::update_item)
                .delete(handlers::items::delete_item),
        )
        .route("/items/status", post(handlers::items::set_items_status))
        .route(
            "/imports",
            post(handlers::imports::submit_import).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/imports/{id}", get(handlers::imports::import_status))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state.config),
            auth_middleware,
        ));

    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::health))
        .merge(protected)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Builds an application state for tests: no migrations are run here, the
/// caller decides how the database is prepared.
pub fn create_test_app_state(config: AppConfig, db: DatabaseConnection) -> AppState {
    let imports = Arc::new(ImportRegistry::from_config(&config.import));
    AppState {
        config: Arc::new(config),
        db,
        imports,
    }
}

/// Starts the server with the given configuration
pub async fn run_server(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let db = db::init_pool(&config).await?;
    db::migrate(&db).await?;

    let addr = config
        .bind_addr()
        .map_err(|e| format!("Invalid server address: {}", e))?;

    let imports = Arc::new(ImportRegistry::from_config(&config.import));
    let state = AppState {
        config: Arc::new(config.clone()),
        db,
        imports,
    };
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    println!("Server listening on: {}", addr);
    println!("Running in profile: {}", config.profile);

    axum::serve(listener, app).await?;

    Ok(())
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::health,
        crate::handlers::items::list_items,
        crate::handlers::items::get_item,
        crate::handlers::items::create_item,
        crate::handlers::items::update_item,
        crate::handlers::items::delete_item,
        crate::handlers::items::set_items_status,
        crate::handlers::imports::submit_import,
        crate::handlers::imports::import_status,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::error::ApiError,
            crate::import::ImportMode,
            crate::import::ImportStatus,
            crate::import::ImportSnapshot,
            crate::import::RowError,
            crate::handlers::items::ItemResponse,
            crate::handlers::items::ItemDetailResponse,
            crate::handlers::items::StockResponse,
            crate::handlers::items::CreateItemRequest,
            crate::handlers::items::UpdateItemRequest,
            crate::handlers::items::SetItemsStatusRequest,
            crate::handlers::items::SetItemsStatusResponse,
            crate::handlers::imports::SubmitImportResponse,
        )
    ),
    info(
        title = "Catalog API",
        description = "Catalog management backend with bulk spreadsheet import",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
