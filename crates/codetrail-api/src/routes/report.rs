//! Report routes consumed by the report UI.

use axum::extract::{Query, State};
use axum::{Json, Router, routing::get};
use codetrail_reporting::application::query_handlers;
use codetrail_reporting::domain::views::{FilterOptionsView, ReportView, StatisticsReportView};
use serde::Serialize;
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::routes::params::ReportParams;
use crate::state::AppState;

/// Successful response wrapper: `{ "success": true, ...view }`.
#[derive(Debug, Serialize)]
pub struct Success<T> {
    pub success: bool,
    #[serde(flatten)]
    pub body: T,
}

impl<T> Success<T> {
    fn new(body: T) -> Json<Self> {
        Json(Self {
            success: true,
            body,
        })
    }
}

/// Response body of GET /filters.
#[derive(Debug, Serialize)]
pub struct FiltersBody {
    pub filters: FilterOptionsView,
}

/// GET /report
#[instrument(skip(state, query))]
async fn report(
    State(state): State<AppState>,
    Query(query): Query<Vec<(String, String)>>,
) -> Result<Json<Success<ReportView>>, ApiError> {
    let params = ReportParams::from_pairs(query)?;
    let repo = state.storage.reader()?;

    let view = query_handlers::build_report(params.filter, state.clock.as_ref(), &*repo).await?;
    info!(rows = view.meta.total, "report built");

    Ok(Success::new(view))
}

/// GET /statistics
#[instrument(skip(state, query))]
async fn statistics(
    State(state): State<AppState>,
    Query(query): Query<Vec<(String, String)>>,
) -> Result<Json<Success<StatisticsReportView>>, ApiError> {
    let params = ReportParams::from_pairs(query)?;
    let repo = state.storage.reader()?;

    let view = query_handlers::build_statistics_report(
        params.filter,
        params.granularity,
        state.clock.as_ref(),
        &*repo,
    )
    .await?;

    Ok(Success::new(view))
}

/// GET /filters
#[instrument(skip(state))]
async fn filters(
    State(state): State<AppState>,
) -> Result<Json<Success<FiltersBody>>, ApiError> {
    let repo = state.storage.reader()?;

    let filters = query_handlers::get_filter_options(&*repo).await?;

    Ok(Success::new(FiltersBody { filters }))
}

/// Returns the report router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/report", get(report))
        .route("/statistics", get(statistics))
        .route("/filters", get(filters))
}
