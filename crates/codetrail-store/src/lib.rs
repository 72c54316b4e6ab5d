//! Codetrail Store — persistence backends.
//!
//! The primary backend is PostgreSQL ([`pg_activity_repository`]); the local
//! fallback is an append-only file sink ([`file_sink`]) that needs no network.

pub mod config;
pub mod file_sink;
mod filter_sql;
pub mod pg_activity_repository;
pub mod schema;
