//! Editor-plugin upload route.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Form, Json, Router, routing::post};
use codetrail_core::activity::{ActivityKind, NewActivity};
use codetrail_core::error::DomainError;
use codetrail_core::legacy::decode_field;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::ApiError;
use crate::state::AppState;

/// One plugin upload. Every value arrives as text; textual fields are
/// additionally percent-encoded by the plugin.
#[derive(Debug, Default, Deserialize)]
pub struct UploadForm {
    /// `open`, `look` or `code`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub time: Option<String>,
    /// Duration in milliseconds.
    pub long: Option<String>,
    pub lang: Option<String>,
    pub file: Option<String>,
    pub proj: Option<String>,
    pub pcid: Option<String>,
    pub vcs_type: Option<String>,
    pub vcs_repo: Option<String>,
    pub vcs_branch: Option<String>,
    pub line: Option<String>,
    #[serde(rename = "char")]
    pub character: Option<String>,
}

impl UploadForm {
    /// Converts the upload into a record.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `time` or `long` is missing or
    /// not an integer, or a text field does not decode to UTF-8.
    pub fn into_activity(self) -> Result<NewActivity, DomainError> {
        let kind = ActivityKind::from_label(self.kind.as_deref().unwrap_or_default());
        let time = required_integer("time", self.time.as_deref())?;
        let duration = required_integer("long", self.long.as_deref())?;

        let mut activity = NewActivity::new(kind, time, duration);
        activity.language = text(self.lang.as_deref())?;
        activity.file = text(self.file.as_deref())?;
        activity.project = text(self.proj.as_deref())?;
        activity.computer_id = text(self.pcid.as_deref())?;
        activity.vcs_type = text(self.vcs_type.as_deref())?;
        activity.vcs_repo = text(self.vcs_repo.as_deref())?;
        activity.vcs_branch = text(self.vcs_branch.as_deref())?;
        activity.line = lenient_integer(self.line.as_deref());
        activity.character = lenient_integer(self.character.as_deref());
        Ok(activity)
    }
}

fn required_integer(field: &str, raw: Option<&str>) -> Result<i64, DomainError> {
    raw.map(str::trim)
        .and_then(|value| value.parse().ok())
        .ok_or_else(|| DomainError::Validation(format!("{field} must be an integer")))
}

fn lenient_integer(raw: Option<&str>) -> i32 {
    raw.and_then(|value| value.trim().parse().ok()).unwrap_or(0)
}

fn text(raw: Option<&str>) -> Result<String, DomainError> {
    raw.map_or_else(|| Ok(String::new()), decode_field)
}

/// Response body for an accepted upload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    /// Records accepted but not yet committed, this one included.
    pub queue_depth: usize,
}

/// POST /activities
#[instrument(skip(state, form))]
async fn upload_activity(
    State(state): State<AppState>,
    Form(form): Form<UploadForm>,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let activity = form.into_activity()?;
    debug!(description = %activity.description(), "accepting upload");

    // The commit completes in the background; the handle is not awaited.
    let _pending = state.storage.write(activity)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(UploadResponse {
            success: true,
            queue_depth: state.storage.queue_depth(),
        }),
    ))
}

/// Returns the upload router.
pub fn router() -> Router<AppState> {
    Router::new().route("/activities", post(upload_activity))
}
