//! Codetrail HTTP API.
//!
//! Plugin uploads go in through `POST /activities`; the report UI reads
//! through `/report`, `/statistics` and `/filters`.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Builds the full router over `state`.
pub fn app(state: AppState) -> Router {
    // TODO: Replace CorsLayer::permissive() with the report UI's origin once it is configurable.
    Router::new()
        .merge(routes::health::router())
        .merge(routes::activities::router())
        .merge(routes::report::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
