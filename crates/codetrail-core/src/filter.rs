//! Query filter — one value shared by row queries and aggregate queries.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::activity::ActivityRecord;

/// Length of the window used when a report names neither bound.
pub const DEFAULT_RANGE_DAYS: i64 = 7;

/// Predicates over stored activities. All set predicates are ANDed; an empty
/// set places no constraint on its dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityFilter {
    /// Inclusive lower bound on `time`.
    pub start: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `time`.
    pub end: Option<DateTime<Utc>>,
    /// Accepted project paths.
    pub projects: Vec<String>,
    /// Accepted languages.
    pub languages: Vec<String>,
    /// Accepted computer identifiers.
    pub computers: Vec<String>,
    /// Accepted file paths.
    pub files: Vec<String>,
    /// Maximum number of rows returned by a row query. `0` means no limit.
    pub limit: Option<u32>,
    /// Number of rows skipped by a row query.
    pub offset: Option<u32>,
}

impl ActivityFilter {
    /// Fills in the trailing seven days ending at `now` when neither bound is
    /// set. A filter with one bound is left open on the other side.
    #[must_use]
    pub fn with_default_range(mut self, now: DateTime<Utc>) -> Self {
        if self.start.is_none() && self.end.is_none() {
            self.start = Some(now - Duration::days(DEFAULT_RANGE_DAYS));
            self.end = Some(now);
        }
        self
    }

    /// The row cap a row query applies. A zero limit is treated as unset.
    #[must_use]
    pub fn row_limit(&self) -> Option<u32> {
        self.limit.filter(|&limit| limit > 0)
    }

    /// Lower bound in epoch milliseconds.
    #[must_use]
    pub fn start_millis(&self) -> Option<i64> {
        self.start.map(|t| t.timestamp_millis())
    }

    /// Upper bound in epoch milliseconds.
    #[must_use]
    pub fn end_millis(&self) -> Option<i64> {
        self.end.map(|t| t.timestamp_millis())
    }

    /// Evaluates the filter predicates (not the pagination) against a record.
    #[must_use]
    pub fn matches(&self, record: &ActivityRecord) -> bool {
        let activity = &record.activity;
        self.start_millis().is_none_or(|start| activity.time >= start)
            && self.end_millis().is_none_or(|end| activity.time <= end)
            && accepts(&self.projects, &activity.project)
            && accepts(&self.languages, &activity.language)
            && accepts(&self.computers, &activity.computer_id)
            && accepts(&self.files, &activity.file)
    }
}

fn accepts(allowed: &[String], value: &str) -> bool {
    allowed.is_empty() || allowed.iter().any(|candidate| candidate == value)
}
