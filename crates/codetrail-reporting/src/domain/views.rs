//! View DTOs serialized by the report endpoints.

use chrono::{DateTime, Utc};
use codetrail_core::activity::ActivityRecord;
use serde::Serialize;

/// Number of groups kept in each top-N list.
pub const TOP_N: u32 = 10;

/// Summed time for one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageTotal {
    /// Language identifier.
    pub language: String,
    /// Summed duration in milliseconds.
    pub duration: i64,
    /// Number of records.
    pub count: i64,
}

/// Summed time for one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectTotal {
    /// Project path.
    pub project: String,
    /// Summed duration in milliseconds.
    pub duration: i64,
    /// Number of records.
    pub count: i64,
}

/// Summary over every record matching a filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsView {
    /// Summed duration in milliseconds.
    pub total_duration: i64,
    /// Number of matching records.
    pub count: i64,
    /// Up to [`TOP_N`] languages by summed duration, highest first.
    pub top_languages: Vec<LanguageTotal>,
    /// Up to [`TOP_N`] projects by summed duration, highest first.
    pub top_projects: Vec<ProjectTotal>,
}

/// One time bucket of a timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodTotal {
    /// Bucket label, e.g. `2026-01-15` for day buckets.
    pub period: String,
    /// Summed duration in milliseconds.
    pub duration: i64,
    /// Number of records in the bucket.
    pub count: i64,
}

/// Values available for each report filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptionsView {
    pub projects: Vec<String>,
    pub languages: Vec<String>,
    pub computers: Vec<String>,
}

/// Filter values echoed back with a report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AppliedFilters {
    pub projects: Vec<String>,
    pub languages: Vec<String>,
    pub computers: Vec<String>,
    pub files: Vec<String>,
}

/// Report metadata: the effective range and filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMeta {
    /// Number of rows in `data`.
    pub total: usize,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub filters: AppliedFilters,
}

/// Rows, statistics and metadata for one report request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportView {
    /// Matching records, newest first.
    pub data: Vec<ActivityRecord>,
    pub statistics: StatisticsView,
    pub meta: ReportMeta,
}

/// Statistics plus a timeline for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatisticsReportView {
    pub statistics: StatisticsView,
    pub timeline: Vec<PeriodTotal>,
}
