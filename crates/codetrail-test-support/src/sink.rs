//! Test sinks — `ActivitySink` implementations that record or fail.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use codetrail_core::activity::NewActivity;
use codetrail_core::error::DomainError;
use codetrail_core::repository::ActivitySink;

/// A sink that records every appended activity in commit order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    appended: Mutex<Vec<NewActivity>>,
}

impl RecordingSink {
    /// Returns a snapshot of the appended activities.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn appended(&self) -> Vec<NewActivity> {
        self.appended.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActivitySink for RecordingSink {
    async fn append(&self, activity: &NewActivity) -> Result<(), DomainError> {
        self.appended.lock().unwrap().push(activity.clone());
        Ok(())
    }
}

/// A sink that fails its first `failures` append attempts, then records like
/// [`RecordingSink`]. `usize::MAX` failures means it never recovers.
#[derive(Debug)]
pub struct FlakySink {
    failures: usize,
    attempts: AtomicUsize,
    inner: RecordingSink,
}

impl FlakySink {
    /// Create a sink that fails `failures` times before succeeding.
    #[must_use]
    pub fn new(failures: usize) -> Self {
        Self {
            failures,
            attempts: AtomicUsize::new(0),
            inner: RecordingSink::default(),
        }
    }

    /// A sink that never accepts a write.
    #[must_use]
    pub fn always_failing() -> Self {
        Self::new(usize::MAX)
    }

    /// Total append attempts, failed ones included.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Activities that were accepted.
    pub fn appended(&self) -> Vec<NewActivity> {
        self.inner.appended()
    }
}

#[async_trait]
impl ActivitySink for FlakySink {
    async fn append(&self, activity: &NewActivity) -> Result<(), DomainError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.failures {
            return Err(DomainError::Infrastructure("connection reset".into()));
        }
        self.inner.append(activity).await
    }
}
