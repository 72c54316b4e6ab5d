//! Test repositories — mock `ActivityRepository` implementations for tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use codetrail_core::activity::{ActivityRecord, NewActivity};
use codetrail_core::error::DomainError;
use codetrail_core::filter::ActivityFilter;
use codetrail_core::repository::{
    ActivityRepository, AggregateRow, Dimension, GroupKey, Totals,
};

/// A repository that keeps records in memory and answers every query the
/// way the PostgreSQL store does.
#[derive(Debug)]
pub struct InMemoryActivityRepository {
    records: Mutex<Vec<ActivityRecord>>,
    created_at: DateTime<Utc>,
    closed: AtomicBool,
}

impl InMemoryActivityRepository {
    /// Create an empty repository stamping `created_at` with `created_at`.
    #[must_use]
    pub fn new(created_at: DateTime<Utc>) -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            created_at,
            closed: AtomicBool::new(false),
        }
    }

    /// Returns a snapshot of all stored records in insertion order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn records(&self) -> Vec<ActivityRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn matching(&self, filter: &ActivityFilter) -> Vec<ActivityRecord> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect()
    }
}

impl Default for InMemoryActivityRepository {
    fn default() -> Self {
        Self::new(crate::FixedClock::standard().0)
    }
}

#[async_trait]
impl ActivityRepository for InMemoryActivityRepository {
    async fn save(&self, activity: &NewActivity) -> Result<ActivityRecord, DomainError> {
        let mut records = self.records.lock().unwrap();
        let id = records.last().map_or(1, |last| last.id + 1);
        let record = ActivityRecord {
            id,
            activity: activity.clone(),
            created_at: self.created_at,
        };
        records.push(record.clone());
        Ok(record)
    }

    async fn find(&self, filter: &ActivityFilter) -> Result<Vec<ActivityRecord>, DomainError> {
        let mut rows = self.matching(filter);
        rows.sort_by(|a, b| {
            b.activity
                .time
                .cmp(&a.activity.time)
                .then(b.id.cmp(&a.id))
        });
        let offset = filter.offset.map_or(0, |o| o as usize);
        let limit = filter.row_limit().map_or(usize::MAX, |l| l as usize);
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }

    async fn totals(&self, filter: &ActivityFilter) -> Result<Totals, DomainError> {
        let rows = self.matching(filter);
        Ok(Totals {
            total_duration: rows.iter().map(|r| r.activity.duration).sum(),
            count: i64::try_from(rows.len()).unwrap_or(i64::MAX),
        })
    }

    async fn aggregate(
        &self,
        filter: &ActivityFilter,
        key: GroupKey,
        limit: Option<u32>,
    ) -> Result<Vec<AggregateRow>, DomainError> {
        let mut groups: HashMap<String, AggregateRow> = HashMap::new();
        for record in self.matching(filter) {
            let label = match key {
                GroupKey::Dimension(dimension) => dimension.value_of(&record).to_owned(),
                GroupKey::Period(granularity) => granularity.label(record.activity.time),
            };
            let row = groups.entry(label.clone()).or_insert(AggregateRow {
                key: label,
                total_duration: 0,
                count: 0,
                first_id: record.id,
            });
            row.total_duration += record.activity.duration;
            row.count += 1;
            row.first_id = row.first_id.min(record.id);
        }

        let mut rows: Vec<AggregateRow> = groups.into_values().collect();
        match key {
            GroupKey::Dimension(_) => rows.sort_by(|a, b| {
                b.total_duration
                    .cmp(&a.total_duration)
                    .then(a.first_id.cmp(&b.first_id))
            }),
            GroupKey::Period(_) => rows.sort_by(|a, b| a.key.cmp(&b.key)),
        }
        if let Some(limit) = limit {
            rows.truncate(limit as usize);
        }
        Ok(rows)
    }

    async fn distinct_values(&self, dimension: Dimension) -> Result<Vec<String>, DomainError> {
        let mut values: Vec<String> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .map(|record| dimension.value_of(record).to_owned())
            .filter(|value| !value.is_empty())
            .collect();
        values.sort();
        values.dedup();
        Ok(values)
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// A repository that always returns an infrastructure error. Useful for
/// testing error-handling paths.
#[derive(Debug, Default)]
pub struct FailingActivityRepository {
    closed: AtomicBool,
}

impl FailingActivityRepository {
    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

fn refused() -> DomainError {
    DomainError::Infrastructure("connection refused".into())
}

#[async_trait]
impl ActivityRepository for FailingActivityRepository {
    async fn save(&self, _activity: &NewActivity) -> Result<ActivityRecord, DomainError> {
        Err(refused())
    }

    async fn find(&self, _filter: &ActivityFilter) -> Result<Vec<ActivityRecord>, DomainError> {
        Err(refused())
    }

    async fn totals(&self, _filter: &ActivityFilter) -> Result<Totals, DomainError> {
        Err(refused())
    }

    async fn aggregate(
        &self,
        _filter: &ActivityFilter,
        _key: GroupKey,
        _limit: Option<u32>,
    ) -> Result<Vec<AggregateRow>, DomainError> {
        Err(refused())
    }

    async fn distinct_values(&self, _dimension: Dimension) -> Result<Vec<String>, DomainError> {
        Err(refused())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
