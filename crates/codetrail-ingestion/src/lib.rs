//! Codetrail Ingestion — the live write path.
//!
//! Producers hand records to a [`storage_context::StorageContext`], which
//! forwards them to a [`write_queue::WriteQueue`]. The queue commits one
//! record at a time to whichever backend was selected at startup and retries
//! failed commits with capped exponential backoff.

pub mod error;
pub mod retry;
pub mod storage_context;
pub mod write_queue;
