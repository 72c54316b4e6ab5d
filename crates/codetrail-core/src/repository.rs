//! Storage abstractions.
//!
//! [`ActivityRepository`] is the queryable primary store. [`ActivitySink`] is
//! the write-only surface the write queue commits through; both the primary
//! store (via [`RepositorySink`]) and the local fallback implement it.

use std::sync::Arc;

use async_trait::async_trait;

use crate::activity::{ActivityRecord, NewActivity};
use crate::error::DomainError;
use crate::filter::ActivityFilter;
use crate::period::Granularity;

/// Column an aggregate or distinct-value query groups on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    /// The `project` column.
    Project,
    /// The `language` column.
    Language,
    /// The `computer_id` column.
    ComputerId,
}

impl Dimension {
    /// Column name in the `activities` table.
    #[must_use]
    pub fn column(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Language => "language",
            Self::ComputerId => "computer_id",
        }
    }

    /// Reads this dimension's value from a record.
    #[must_use]
    pub fn value_of(self, record: &ActivityRecord) -> &str {
        match self {
            Self::Project => &record.activity.project,
            Self::Language => &record.activity.language,
            Self::ComputerId => &record.activity.computer_id,
        }
    }
}

/// Grouping applied by [`ActivityRepository::aggregate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    /// Group by a column. Rows come back by summed duration descending, ties
    /// broken by the lowest id in the group.
    Dimension(Dimension),
    /// Group by time bucket. Rows come back by label ascending.
    Period(Granularity),
}

/// `SUM(duration)` and `COUNT(*)` over the whole filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    /// Summed duration in milliseconds.
    pub total_duration: i64,
    /// Number of matching records.
    pub count: i64,
}

/// One group of an aggregate query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateRow {
    /// Column value or period label.
    pub key: String,
    /// Summed duration in milliseconds.
    pub total_duration: i64,
    /// Number of records in the group.
    pub count: i64,
    /// Lowest record id in the group, used as a deterministic tie-breaker.
    pub first_id: i64,
}

/// Queryable durable store of activity records.
#[async_trait]
pub trait ActivityRepository: Send + Sync {
    /// Inserts one record. The store assigns `id` and `created_at`.
    async fn save(&self, activity: &NewActivity) -> Result<ActivityRecord, DomainError>;

    /// Matching records, newest `time` first, honoring `limit` and `offset`.
    async fn find(&self, filter: &ActivityFilter) -> Result<Vec<ActivityRecord>, DomainError>;

    /// Summed duration and count over all matching records.
    async fn totals(&self, filter: &ActivityFilter) -> Result<Totals, DomainError>;

    /// Grouped sums over matching records. `limit` caps the number of groups.
    async fn aggregate(
        &self,
        filter: &ActivityFilter,
        key: GroupKey,
        limit: Option<u32>,
    ) -> Result<Vec<AggregateRow>, DomainError>;

    /// Sorted, non-empty distinct values of a column.
    async fn distinct_values(&self, dimension: Dimension) -> Result<Vec<String>, DomainError>;

    /// Releases held connections.
    async fn close(&self) {}
}

/// Write-only destination for the write queue.
#[async_trait]
pub trait ActivitySink: Send + Sync {
    /// Durably appends one record, or fails without a partial write.
    async fn append(&self, activity: &NewActivity) -> Result<(), DomainError>;

    /// Flushes and releases held resources.
    async fn close(&self) {}
}

/// Adapts a repository to the sink interface.
#[derive(Clone)]
pub struct RepositorySink(pub Arc<dyn ActivityRepository>);

#[async_trait]
impl ActivitySink for RepositorySink {
    async fn append(&self, activity: &NewActivity) -> Result<(), DomainError> {
        self.0.save(activity).await.map(|_| ())
    }

    async fn close(&self) {
        self.0.close().await;
    }
}
