//! Importer error types.

use std::path::PathBuf;

use thiserror::Error;

/// Failures that stop an import before any line is read.
///
/// Malformed lines and failed saves are not errors at this level; they are
/// counted in the [`crate::ImportSummary`].
#[derive(Debug, Error)]
pub enum ImportError {
    /// The import folder does not exist or is not a directory.
    #[error("import folder not found: {}", .0.display())]
    FolderNotFound(PathBuf),

    /// A file or folder could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        /// The path that failed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
