//! Shared application state.

use std::sync::Arc;

use codetrail_core::clock::Clock;
use codetrail_ingestion::storage_context::StorageContext;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Active storage backend and its write queue.
    pub storage: Arc<StorageContext>,
    /// Source of "now" for default report ranges.
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(storage: Arc<StorageContext>, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }
}
