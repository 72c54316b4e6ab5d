//! Integration tests for the health endpoint.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use codetrail_test_support::InMemoryActivityRepository;

#[tokio::test]
async fn test_health_reports_primary_backend() {
    let app = common::build_test_app(Arc::new(InMemoryActivityRepository::default())).await;

    let (status, json) = common::get_json(app.router(), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["storage"], "primary");
    assert_eq!(json["queueDepth"], 0);
}

#[tokio::test]
async fn test_health_reports_fallback_backend() {
    let app = common::build_fallback_app().await;

    let (status, json) = common::get_json(app.router(), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["storage"], "fallback");
}

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let app = common::build_fallback_app().await;

    let request = axum::http::Request::builder()
        .method("GET")
        .uri("/api/v1/nonexistent")
        .body(axum::body::Body::empty())
        .unwrap();

    let response = tower::ServiceExt::oneshot(app.router(), request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
