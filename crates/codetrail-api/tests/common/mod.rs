//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use codetrail_core::repository::ActivityRepository;
use codetrail_ingestion::retry::RetryPolicy;
use codetrail_ingestion::storage_context::{StorageConfig, StorageContext};
use codetrail_test_support::FixedClock;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use codetrail_api::state::AppState;

/// A running app plus the handles tests need to inspect it.
pub struct TestApp {
    pub storage: Arc<StorageContext>,
    pub state: AppState,
    /// Keeps the fallback directory alive for the test's duration.
    pub fallback_dir: TempDir,
}

impl TestApp {
    /// A fresh router over the shared state.
    pub fn router(&self) -> Router {
        codetrail_api::app(self.state.clone())
    }
}

fn storage_config(fallback_dir: &TempDir, use_primary: bool) -> StorageConfig {
    StorageConfig {
        use_primary,
        fallback_dir: fallback_dir.path().to_path_buf(),
        retry: RetryPolicy {
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        },
        drain_timeout: Duration::from_secs(5),
    }
}

async fn build(primary: Option<Arc<dyn ActivityRepository>>) -> TestApp {
    let fallback_dir = tempfile::tempdir().unwrap();
    let config = storage_config(&fallback_dir, primary.is_some());
    let storage = StorageContext::init(&config, || async move {
        primary.ok_or_else(|| {
            codetrail_core::error::DomainError::Infrastructure("no primary".to_owned())
        })
    })
    .await
    .unwrap();
    let storage = Arc::new(storage);
    let state = AppState::new(Arc::clone(&storage), Arc::new(FixedClock::standard()));
    TestApp {
        storage,
        state,
        fallback_dir,
    }
}

/// Build the app over a queryable primary store with a fixed clock
/// (2026-01-15T10:00:00Z).
pub async fn build_test_app(repository: Arc<dyn ActivityRepository>) -> TestApp {
    build(Some(repository)).await
}

/// Build the app with the write-only file fallback active.
pub async fn build_fallback_app() -> TestApp {
    build(None).await
}

async fn into_json(response: axum::response::Response) -> (StatusCode, serde_json::Value) {
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
    (status, json)
}

/// Send a form-encoded POST request and return the response.
pub async fn post_form(app: Router, uri: &str, body: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_owned()))
        .unwrap();

    into_json(app.oneshot(request).await.unwrap()).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    into_json(app.oneshot(request).await.unwrap()).await
}
