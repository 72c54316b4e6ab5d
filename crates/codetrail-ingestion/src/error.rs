//! Ingestion error types.

use codetrail_core::error::DomainError;
use thiserror::Error;

/// Errors surfaced by the write path. Commit failures are never among them;
/// those are retried inside the queue.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The record breaks a model invariant and was not queued.
    #[error("rejected: {0}")]
    Rejected(#[from] DomainError),

    /// The queue has been shut down.
    #[error("write queue is closed")]
    QueueClosed,

    /// Neither backend could be initialised.
    #[error("storage initialization failed: {0}")]
    Initialization(String),
}
