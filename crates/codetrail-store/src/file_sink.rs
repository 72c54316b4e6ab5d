//! Local fallback store: an append-only directory of legacy-format files.
//!
//! Records land in `<dir>/<YYYY-MM-DD>.db` (UTC day of the activity), in the
//! version `4.0` line format, so a fallback directory can later be replayed
//! into the primary store with the legacy importer. The sink cannot be
//! queried.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::DateTime;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::info;

use codetrail_core::activity::NewActivity;
use codetrail_core::error::DomainError;
use codetrail_core::legacy::{LegacyVersion, encode_line};
use codetrail_core::repository::ActivitySink;

/// File extension the legacy importer looks for.
pub const FILE_EXTENSION: &str = "db";

/// Append-only file sink.
#[derive(Debug)]
pub struct FileActivitySink {
    dir: PathBuf,
    // Serializes appends so header and lines never interleave.
    write_lock: Mutex<()>,
}

impl FileActivitySink {
    /// Creates the directory if needed and checks it is writable.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the directory cannot be
    /// created or written to.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, DomainError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).await.map_err(|e| {
            DomainError::Infrastructure(format!("cannot create {}: {e}", dir.display()))
        })?;
        let metadata = fs::metadata(&dir).await.map_err(|e| {
            DomainError::Infrastructure(format!("cannot stat {}: {e}", dir.display()))
        })?;
        if metadata.permissions().readonly() {
            return Err(DomainError::Infrastructure(format!(
                "{} is read-only",
                dir.display()
            )));
        }
        info!(dir = %dir.display(), "file activity sink ready");
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    /// Directory the sink writes into.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the day file an activity belongs to.
    #[must_use]
    pub fn path_for(&self, activity: &NewActivity) -> PathBuf {
        let day = DateTime::from_timestamp_millis(activity.time).map_or_else(
            || "unknown".to_owned(),
            |at| at.format("%Y-%m-%d").to_string(),
        );
        self.dir.join(format!("{day}.{FILE_EXTENSION}"))
    }
}

#[async_trait]
impl ActivitySink for FileActivitySink {
    async fn append(&self, activity: &NewActivity) -> Result<(), DomainError> {
        let path = self.path_for(activity);
        let io_error =
            |e: std::io::Error| DomainError::Infrastructure(format!("{}: {e}", path.display()));

        let _guard = self.write_lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(io_error)?;

        let mut chunk = String::new();
        if file.metadata().await.map_err(io_error)?.len() == 0 {
            chunk.push_str(&LegacyVersion::V4.to_string());
            chunk.push('\n');
        }
        chunk.push_str(&encode_line(activity));
        chunk.push('\n');

        file.write_all(chunk.as_bytes()).await.map_err(io_error)?;
        file.sync_data().await.map_err(io_error)?;
        Ok(())
    }
}
