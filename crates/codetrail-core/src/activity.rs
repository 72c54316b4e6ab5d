//! Activity records — the unit every component reads and writes.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// What the developer was doing with the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    /// The file was opened.
    Open,
    /// The file was in focus without being changed.
    Look,
    /// The file was being edited.
    Edit,
}

impl ActivityKind {
    /// Maps a stored numeric code. Unknown codes normalize to `Open`.
    #[must_use]
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Look,
            2 => Self::Edit,
            _ => Self::Open,
        }
    }

    /// Maps an upload label (`open`, `look`, `code`). Unknown labels
    /// normalize to `Open`.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label {
            "look" => Self::Look,
            "code" | "edit" => Self::Edit,
            _ => Self::Open,
        }
    }

    /// Numeric code persisted in the `kind` column and in legacy files.
    #[must_use]
    pub fn code(self) -> i16 {
        match self {
            Self::Open => 0,
            Self::Look => 1,
            Self::Edit => 2,
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Open => "open",
            Self::Look => "look",
            Self::Edit => "edit",
        };
        f.write_str(label)
    }
}

/// An activity that has not been persisted yet.
///
/// Textual fields are plain (already decoded) strings; an empty string means
/// the producer did not report that dimension. Empty VCS fields mean there is
/// no version-control context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewActivity {
    /// Open, look or edit.
    pub kind: ActivityKind,
    /// Start of the activity in milliseconds since the Unix epoch.
    pub time: i64,
    /// Length of the activity in milliseconds.
    pub duration: i64,
    /// Editor language identifier.
    #[serde(default)]
    pub language: String,
    /// File path.
    #[serde(default)]
    pub file: String,
    /// Project (workspace root) path.
    #[serde(default)]
    pub project: String,
    /// Identifier of the machine that produced the event.
    #[serde(default)]
    pub computer_id: String,
    /// Version-control system, e.g. `git`.
    #[serde(default)]
    pub vcs_type: String,
    /// Repository name or remote.
    #[serde(default)]
    pub vcs_repo: String,
    /// Branch checked out at the time.
    #[serde(default)]
    pub vcs_branch: String,
    /// Cursor line.
    #[serde(default)]
    pub line: i32,
    /// Cursor column.
    #[serde(default, rename = "char")]
    pub character: i32,
}

impl NewActivity {
    /// Creates an activity with the required fields and every optional field
    /// left empty.
    #[must_use]
    pub fn new(kind: ActivityKind, time: i64, duration: i64) -> Self {
        Self {
            kind,
            time,
            duration,
            language: String::new(),
            file: String::new(),
            project: String::new(),
            computer_id: String::new(),
            vcs_type: String::new(),
            vcs_repo: String::new(),
            vcs_branch: String::new(),
            line: 0,
            character: 0,
        }
    }

    /// Checks the invariants every stored record must hold.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `time` is not positive or
    /// `duration` is negative.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.time <= 0 {
            return Err(DomainError::Validation(format!(
                "time must be positive, got {}",
                self.time
            )));
        }
        if self.duration < 0 {
            return Err(DomainError::Validation(format!(
                "duration must not be negative, got {}",
                self.duration
            )));
        }
        Ok(())
    }

    /// Human-readable one-liner used in write logs, e.g. `edit (src/main.rs) 2m 5s`.
    #[must_use]
    pub fn description(&self) -> String {
        format!(
            "{} ({}) {}",
            self.kind,
            self.file,
            readable_duration(self.duration)
        )
    }
}

/// Renders milliseconds as `"<m>m <s>s"` past one minute, `"<s>s"` otherwise.
#[must_use]
pub fn readable_duration(ms: i64) -> String {
    let mut seconds = ms / 1000;
    let mut minutes = 0;
    if seconds > 60 {
        minutes = seconds / 60;
        seconds -= minutes * 60;
    }
    if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

/// A persisted activity. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    /// Store-assigned identifier, never reused.
    pub id: i64,
    /// The activity as submitted.
    #[serde(flatten)]
    pub activity: NewActivity,
    /// Insertion time, set by the store.
    pub created_at: DateTime<Utc>,
}
