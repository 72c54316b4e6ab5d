//! Codetrail API server entry point.

use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

use codetrail_api::config::AppConfig;
use codetrail_api::error::AppError;
use codetrail_api::state::AppState;
use codetrail_core::clock::SystemClock;
use codetrail_core::repository::ActivityRepository;
use codetrail_ingestion::storage_context::StorageContext;
use codetrail_store::pg_activity_repository::PgActivityRepository;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Codetrail API server");

    let config = AppConfig::from_env()?;

    // Select the storage backend once; an unreachable primary falls back to files.
    let database = config.database.clone();
    let storage = StorageContext::init(&config.storage, || async move {
        PgActivityRepository::connect(&database)
            .await
            .map(|repository| Arc::new(repository) as Arc<dyn ActivityRepository>)
    })
    .await
    .map_err(AppError::from)?;
    let storage = Arc::new(storage);

    let app = codetrail_api::app(AppState::new(Arc::clone(&storage), Arc::new(SystemClock)));

    // Start server.
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(AppError::from)?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::from)?;

    let report = storage.disconnect().await;
    tracing::info!(
        drained = report.drained,
        abandoned = report.abandoned,
        "Codetrail API server stopped"
    );

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
