//! Read-only views returned by the query handlers.

pub mod views;
