//! Codetrail Core — shared activity model and storage abstractions.
//!
//! This crate defines the activity record, the query filter, and the traits
//! every storage backend implements. It contains no infrastructure code.

pub mod activity;
pub mod clock;
pub mod error;
pub mod filter;
pub mod legacy;
pub mod period;
pub mod repository;
