//! File and folder import.

use std::ops::AddAssign;
use std::path::{Path, PathBuf};

use codetrail_core::activity::NewActivity;
use codetrail_core::error::DomainError;
use codetrail_core::legacy::{LegacyVersion, decode_line};
use codetrail_core::repository::ActivityRepository;
use codetrail_store::file_sink::FILE_EXTENSION;
use tokio::fs;
use tracing::{error, info, warn};

use crate::error::ImportError;

/// Outcome of importing one file or a whole folder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Records saved.
    pub processed: usize,
    /// Lines (or whole files) that could not be imported.
    pub errors: usize,
}

impl ImportSummary {
    fn rejected_file() -> Self {
        Self {
            processed: 0,
            errors: 1,
        }
    }
}

impl AddAssign for ImportSummary {
    fn add_assign(&mut self, other: Self) {
        self.processed += other.processed;
        self.errors += other.errors;
    }
}

/// Imports the text of one legacy file.
///
/// The first line must be a supported version token; otherwise the whole
/// file counts as a single error. Blank lines are skipped. Every other line
/// is decoded, validated and saved; any failure counts one error and the
/// import moves on to the next line.
pub async fn import_content(
    name: &str,
    content: &str,
    repo: &dyn ActivityRepository,
) -> ImportSummary {
    let mut lines = content.split(['\n', '\r']);
    let header = lines.next().unwrap_or_default().trim();
    let Some(version) = LegacyVersion::parse(header) else {
        error!(file = name, version = header, "unsupported file version");
        return ImportSummary::rejected_file();
    };

    let mut summary = ImportSummary::default();
    for (index, raw) in lines.enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        match import_line(line, version, repo).await {
            Ok(()) => summary.processed += 1,
            Err(e) => {
                error!(file = name, line = index + 1, error = %e, "cannot import line");
                summary.errors += 1;
            }
        }
    }

    info!(
        file = name,
        processed = summary.processed,
        errors = summary.errors,
        "file imported"
    );
    summary
}

async fn import_line(
    line: &str,
    version: LegacyVersion,
    repo: &dyn ActivityRepository,
) -> Result<(), DomainError> {
    let activity: NewActivity = decode_line(line, version)?;
    activity.validate()?;
    repo.save(&activity).await?;
    Ok(())
}

/// Imports one legacy file.
///
/// # Errors
///
/// Returns `ImportError::Read` if the file cannot be read as UTF-8 text.
pub async fn import_file(
    path: &Path,
    repo: &dyn ActivityRepository,
) -> Result<ImportSummary, ImportError> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|source| ImportError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    Ok(import_content(&name, &content, repo).await)
}

/// Imports every `*.db` file in `dir`, in file-name order.
///
/// A file that cannot be read counts as one error. An empty folder is not an
/// error.
///
/// # Errors
///
/// Returns `ImportError::FolderNotFound` if `dir` is not a directory, or
/// `ImportError::Read` if it cannot be listed.
pub async fn import_directory(
    dir: &Path,
    repo: &dyn ActivityRepository,
) -> Result<ImportSummary, ImportError> {
    let files = legacy_files(dir).await?;
    if files.is_empty() {
        warn!(dir = %dir.display(), "no .{FILE_EXTENSION} files found");
        return Ok(ImportSummary::default());
    }
    info!(dir = %dir.display(), files = files.len(), "importing legacy files");

    let mut total = ImportSummary::default();
    for path in &files {
        match import_file(path, repo).await {
            Ok(summary) => total += summary,
            Err(e) => {
                error!(error = %e, "skipping unreadable file");
                total += ImportSummary::rejected_file();
            }
        }
    }

    info!(
        files = files.len(),
        processed = total.processed,
        errors = total.errors,
        "import finished"
    );
    Ok(total)
}

async fn legacy_files(dir: &Path) -> Result<Vec<PathBuf>, ImportError> {
    let is_dir = fs::metadata(dir).await.is_ok_and(|m| m.is_dir());
    if !is_dir {
        return Err(ImportError::FolderNotFound(dir.to_path_buf()));
    }
    let read_error = |source| ImportError::Read {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = fs::read_dir(dir).await.map_err(read_error)?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(read_error)? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == FILE_EXTENSION) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use codetrail_core::activity::ActivityKind;
    use codetrail_test_support::{FailingActivityRepository, InMemoryActivityRepository};

    use super::*;

    #[tokio::test]
    async fn test_short_v3_line_is_counted_and_skipped() {
        // Arrange
        let repo = InMemoryActivityRepository::default();
        let content = "3.0\n\
            2 1768471200000 5000 rust src%2Fmain.rs %2Fwork%2Fa pc-1\n\
            2 1768471260000 5000 rust src/main.rs /work/a\n\
            1 1768471320000 1000 go main.go %2Fwork%2Fb pc-1\n";

        // Act
        let summary = import_content("2026-01-15.db", content, &repo).await;

        // Assert
        assert_eq!(
            summary,
            ImportSummary {
                processed: 2,
                errors: 1
            }
        );
        let records = repo.records();
        assert_eq!(records[0].activity.file, "src/main.rs");
        assert_eq!(records[0].activity.project, "/work/a");
        assert_eq!(records[1].activity.kind, ActivityKind::Look);
    }

    #[tokio::test]
    async fn test_unsupported_version_rejects_whole_file() {
        let repo = InMemoryActivityRepository::default();

        let summary = import_content(
            "old.db",
            "2.0\n2 1768471200000 5000 rust a b c\n",
            &repo,
        )
        .await;

        assert_eq!(summary, ImportSummary::rejected_file());
        assert!(repo.records().is_empty());
    }

    #[tokio::test]
    async fn test_empty_file_is_one_error() {
        let repo = InMemoryActivityRepository::default();

        let summary = import_content("empty.db", "", &repo).await;

        assert_eq!(summary.errors, 1);
    }

    #[tokio::test]
    async fn test_v4_line_carries_vcs_and_cursor() {
        let repo = InMemoryActivityRepository::default();
        let content =
            "4.0\r\n2 1768471200000 5000 rust src/lib.rs /work/a pc-1 git:repo:main 10 5 0 0\r\n";

        let summary = import_content("2026-01-15.db", content, &repo).await;

        assert_eq!(summary.processed, 1);
        assert_eq!(summary.errors, 0);
        let activity = &repo.records()[0].activity;
        assert_eq!(activity.vcs_type, "git");
        assert_eq!(activity.vcs_repo, "repo");
        assert_eq!(activity.vcs_branch, "main");
        assert_eq!(activity.line, 10);
        assert_eq!(activity.character, 5);
    }

    #[tokio::test]
    async fn test_malformed_escape_counts_line_as_error() {
        let repo = InMemoryActivityRepository::default();
        let content = "3.0\n2 1768471200000 5000 rust src%zzmain.rs %2Fwork pc-1\n";

        let summary = import_content("2026-01-15.db", content, &repo).await;

        assert_eq!(summary, ImportSummary { processed: 0, errors: 1 });
        assert!(repo.records().is_empty());
    }

    #[tokio::test]
    async fn test_non_numeric_time_and_failed_saves_count_as_errors() {
        let content = "3.0\n2 soon 5000 rust a b c\n2 1768471200000 5000 rust a b c\n";

        let summary = import_content("x.db", content, &InMemoryActivityRepository::default()).await;
        let failing = import_content("x.db", content, &FailingActivityRepository::default()).await;

        assert_eq!(summary, ImportSummary { processed: 1, errors: 1 });
        assert_eq!(failing, ImportSummary { processed: 0, errors: 2 });
    }

    #[tokio::test]
    async fn test_directory_import_totals_db_files_in_name_order() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("b.db"),
            "3.0\n2 1768471300000 1000 go a b c\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("a.db"),
            "3.0\n2 1768471200000 1000 rust a b c\nbroken\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "3.0\n2 1 1 x a b c\n").unwrap();
        std::fs::write(dir.path().join("bad.db"), [0xff, 0xfe, 0x00]).unwrap();
        let repo = InMemoryActivityRepository::default();

        // Act
        let summary = import_directory(dir.path(), &repo).await.unwrap();

        // Assert
        assert_eq!(
            summary,
            ImportSummary {
                processed: 2,
                errors: 2
            }
        );
        let languages: Vec<String> = repo
            .records()
            .into_iter()
            .map(|r| r.activity.language)
            .collect();
        assert_eq!(languages, vec!["rust".to_owned(), "go".to_owned()]);
    }

    #[tokio::test]
    async fn test_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();

        let result =
            import_directory(&dir.path().join("missing"), &InMemoryActivityRepository::default())
                .await;

        assert!(matches!(result, Err(ImportError::FolderNotFound(_))));
    }
}
