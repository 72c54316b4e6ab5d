//! Codetrail legacy importer.
//!
//! Replays folders of version `3.0`/`4.0` flat files (the format the legacy
//! tracker wrote, and the format the local fallback store still writes) into
//! an [`codetrail_core::repository::ActivityRepository`].

pub mod error;
pub mod importer;

pub use error::ImportError;
pub use importer::{ImportSummary, import_content, import_directory, import_file};
