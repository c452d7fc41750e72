use crate::config::AppConfig;
use crate::db::{init_pool, migrate};
use crate::server::{create_app, create_test_app_state};
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use tower::ServiceExt;

async fn setup_app() -> axum::Router {
    let config = AppConfig {
        database_url: "sqlite::memory:".to_string(),
        db_max_connections: 1,
        admin_tokens: vec!["admin-token-123".to_string()],
        ..Default::default()
    };

    let db = init_pool(&config).await.expect("Failed to init test DB");
    migrate(&db).await.expect("Failed to migrate test DB");

    create_app(create_test_app_state(config, db))
}

#[tokio::test]
async fn test_root_returns_service_info() {
    let app = setup_app().await;

    let request = Request::builder()
        .method("GET")
        .uri("/")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let info: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(info["service"], "catalog-api");
    assert!(info["version"].is_string());
}

#[tokio::test]
async fn test_healthz_pings_database() {
    let app = setup_app().await;

    let request = Request::builder()
        .method("GET")
        .uri("/healthz")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let health: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(health["status"], "ok");
}

#[tokio::test]
async fn test_root_is_public() {
    // No Authorization header required for the service info endpoint
    let app = setup_app().await;

    let request = Request::builder()
        .method("GET")
        .uri("/")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
