//! Codetrail query and aggregation engine.
//!
//! Filtered row queries, summary statistics, period timelines and the
//! distinct-value lists that populate report filters. Everything here reads
//! through [`codetrail_core::repository::ActivityRepository`] and never writes.

pub mod application;
pub mod domain;
