//! Time buckets for timeline aggregation.

use chrono::{DateTime, Datelike};
use serde::{Deserialize, Serialize};

/// Width of a timeline bucket. Labels are computed in UTC and sort
/// chronologically as plain strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// `2026-01-15 10:00:00`
    Hour,
    /// `2026-01-15`
    #[default]
    Day,
    /// `2026-W03`, weeks counted from January 1st.
    Week,
    /// `2026-01`
    Month,
}

impl Granularity {
    /// Parses a `groupBy` value. Anything unrecognised buckets by day.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "hour" => Self::Hour,
            "week" => Self::Week,
            "month" => Self::Month,
            _ => Self::Day,
        }
    }

    /// PostgreSQL `to_char` pattern producing the same label as [`Self::label`].
    #[must_use]
    pub fn pg_pattern(self) -> &'static str {
        match self {
            Self::Hour => "YYYY-MM-DD HH24:00:00",
            Self::Day => "YYYY-MM-DD",
            Self::Week => "YYYY-\"W\"WW",
            Self::Month => "YYYY-MM",
        }
    }

    /// Bucket label of an epoch-millisecond timestamp.
    #[must_use]
    pub fn label(self, time_ms: i64) -> String {
        let Some(at) = DateTime::from_timestamp_millis(time_ms) else {
            return String::new();
        };
        match self {
            Self::Hour => at.format("%Y-%m-%d %H:00:00").to_string(),
            Self::Day => at.format("%Y-%m-%d").to_string(),
            Self::Week => format!("{}-W{:02}", at.year(), at.ordinal0() / 7 + 1),
            Self::Month => at.format("%Y-%m").to_string(),
        }
    }
}
