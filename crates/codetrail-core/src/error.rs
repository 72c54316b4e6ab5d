//! Domain error types.

use thiserror::Error;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Malformed input: a record, a legacy line, or a filter.
    #[error("validation error: {0}")]
    Validation(String),

    /// The backing store cannot serve reads (the fallback sink is active).
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}
