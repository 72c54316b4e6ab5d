//! Application layer for the reporting context.

pub mod query_handlers;
