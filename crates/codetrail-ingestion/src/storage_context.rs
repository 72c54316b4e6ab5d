//! Backend selection and the uniform write/read handle.
//!
//! A `StorageContext` is built once at startup and passed to everything that
//! writes or reads. It tries the primary store first and falls back to the
//! local file sink if the primary cannot be initialised. The choice is not
//! revisited at runtime: a primary that goes away later is retried by the
//! write queue, not swapped out.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use codetrail_core::activity::NewActivity;
use codetrail_core::error::DomainError;
use codetrail_core::repository::{ActivityRepository, ActivitySink, RepositorySink};
use codetrail_store::file_sink::FileActivitySink;
use tracing::{error, info, warn};

use crate::error::IngestError;
use crate::retry::RetryPolicy;
use crate::write_queue::{CommitHandle, ShutdownReport, WriteQueue};

/// Startup settings for the storage layer.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Try the primary store before falling back.
    pub use_primary: bool,
    /// Directory of the local fallback store.
    pub fallback_dir: PathBuf,
    /// Backoff between failed commits.
    pub retry: RetryPolicy,
    /// How long `disconnect` waits for the queue to drain.
    pub drain_timeout: Duration,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            use_primary: true,
            fallback_dir: PathBuf::from("./database"),
            retry: RetryPolicy::default(),
            drain_timeout: Duration::from_secs(10),
        }
    }
}

/// Which backend is active.
enum Backend {
    Primary(Arc<dyn ActivityRepository>),
    Fallback,
}

/// The storage handle shared by producers and readers.
pub struct StorageContext {
    backend: Backend,
    sink: Arc<dyn ActivitySink>,
    queue: WriteQueue,
    drain_timeout: Duration,
}

impl StorageContext {
    /// Selects the backend and starts the write queue.
    ///
    /// `connect_primary` is only awaited when `config.use_primary` is set. Any
    /// error it returns is logged and the local fallback is used instead.
    ///
    /// # Errors
    ///
    /// Returns `IngestError::Initialization` if the fallback store cannot be
    /// opened either.
    pub async fn init<F, Fut>(config: &StorageConfig, connect_primary: F) -> Result<Self, IngestError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<dyn ActivityRepository>, DomainError>>,
    {
        let primary = if config.use_primary {
            match connect_primary().await {
                Ok(repository) => Some(repository),
                Err(e) => {
                    error!(error = %e, "primary store initialization failed, falling back to file storage");
                    None
                }
            }
        } else {
            info!("file storage fallback forced by configuration");
            None
        };

        let (backend, sink): (Backend, Arc<dyn ActivitySink>) = match primary {
            Some(repository) => {
                info!("using PostgreSQL storage");
                let sink: Arc<dyn ActivitySink> =
                    Arc::new(RepositorySink(Arc::clone(&repository)));
                (Backend::Primary(repository), sink)
            }
            None => {
                let file_sink = FileActivitySink::open(&config.fallback_dir)
                    .await
                    .map_err(|e| IngestError::Initialization(e.to_string()))?;
                info!(dir = %config.fallback_dir.display(), "using file storage");
                let sink: Arc<dyn ActivitySink> = Arc::new(file_sink);
                (Backend::Fallback, sink)
            }
        };

        Ok(Self {
            backend,
            queue: WriteQueue::spawn(Arc::clone(&sink), config.retry),
            sink,
            drain_timeout: config.drain_timeout,
        })
    }

    /// Queues a record for the active backend and returns immediately.
    ///
    /// # Errors
    ///
    /// Returns `IngestError::Rejected` for a record that breaks a model
    /// invariant, or `IngestError::QueueClosed` after [`Self::disconnect`].
    pub fn write(&self, activity: NewActivity) -> Result<CommitHandle, IngestError> {
        activity.validate()?;
        let description = activity.description();
        self.queue.add(activity, description).inspect_err(|e| {
            error!(error = %e, "storage write after disconnect");
        })
    }

    /// Whether the primary store is active.
    #[must_use]
    pub fn is_using_primary(&self) -> bool {
        matches!(self.backend, Backend::Primary(_))
    }

    /// The queryable store, if the primary is active.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Unavailable` while the write-only fallback is
    /// active.
    pub fn reader(&self) -> Result<Arc<dyn ActivityRepository>, DomainError> {
        match &self.backend {
            Backend::Primary(repository) => Ok(Arc::clone(repository)),
            Backend::Fallback => Err(DomainError::Unavailable(
                "queries need the primary store; file storage fallback is active".to_owned(),
            )),
        }
    }

    /// Records accepted but not yet committed.
    #[must_use]
    pub fn queue_depth(&self) -> usize {
        self.queue.depth()
    }

    /// Drains the write queue (bounded by the configured grace period) and
    /// then closes the active backend. The backend is closed whether or not
    /// the drain finished.
    pub async fn disconnect(&self) -> ShutdownReport {
        let report = self.queue.shutdown(self.drain_timeout).await;
        if !report.drained {
            warn!(abandoned = report.abandoned, "closing storage with writes still pending");
        }
        self.sink.close().await;
        info!("storage disconnected");
        report
    }
}

#[cfg(test)]
mod tests {
    use codetrail_core::activity::ActivityKind;
    use codetrail_core::repository::ActivityRepository;
    use codetrail_test_support::{FailingActivityRepository, InMemoryActivityRepository};

    use super::*;

    fn config(dir: &std::path::Path) -> StorageConfig {
        StorageConfig {
            use_primary: true,
            fallback_dir: dir.to_path_buf(),
            retry: RetryPolicy {
                base_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(5),
            },
            drain_timeout: Duration::from_secs(5),
        }
    }

    fn activity() -> NewActivity {
        let mut activity = NewActivity::new(ActivityKind::Edit, 1_768_471_200_000, 2_000);
        activity.file = "src/lib.rs".to_owned();
        activity
    }

    async fn unreachable_primary() -> Result<Arc<dyn ActivityRepository>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    #[tokio::test]
    async fn test_unreachable_primary_falls_back_silently() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();

        // Act
        let storage = StorageContext::init(&config(dir.path()), unreachable_primary)
            .await
            .unwrap();
        let handle = storage.write(activity()).unwrap();

        // Assert
        assert!(!storage.is_using_primary());
        assert!(handle.committed().await);
        assert!(dir.path().join("2026-01-15.db").exists());
        assert!(matches!(storage.reader(), Err(DomainError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_reachable_primary_receives_writes() {
        let dir = tempfile::tempdir().unwrap();
        let repository = Arc::new(InMemoryActivityRepository::default());
        let primary: Arc<dyn ActivityRepository> = repository.clone();

        let storage = StorageContext::init(&config(dir.path()), || async move {
            Ok::<_, DomainError>(primary)
        })
        .await
        .unwrap();
        let committed = storage.write(activity()).unwrap().committed().await;

        assert!(committed);
        assert!(storage.is_using_primary());
        assert!(storage.reader().is_ok());
        assert_eq!(repository.records().len(), 1);
        assert_eq!(repository.records()[0].activity, activity());
    }

    #[tokio::test]
    async fn test_forced_fallback_skips_primary() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.use_primary = false;

        let storage = StorageContext::init(
            &config,
            || -> std::future::Ready<Result<Arc<dyn ActivityRepository>, DomainError>> {
                panic!("primary must not be contacted")
            },
        )
        .await
        .unwrap();

        assert!(!storage.is_using_primary());
    }

    #[tokio::test]
    async fn test_unusable_fallback_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let blocked = dir.path().join("blocked");
        std::fs::write(&blocked, b"not a directory").unwrap();

        let result = StorageContext::init(&config(&blocked), unreachable_primary).await;

        assert!(matches!(result, Err(IngestError::Initialization(_))));
    }

    #[tokio::test]
    async fn test_invalid_record_is_rejected_before_queueing() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageContext::init(&config(dir.path()), unreachable_primary)
            .await
            .unwrap();

        let result = storage.write(NewActivity::new(ActivityKind::Open, 0, 5));

        assert!(matches!(result, Err(IngestError::Rejected(_))));
        assert_eq!(storage.queue_depth(), 0);
    }

    #[tokio::test]
    async fn test_disconnect_drains_then_rejects_writes() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageContext::init(&config(dir.path()), unreachable_primary)
            .await
            .unwrap();
        storage.write(activity()).unwrap();

        let report = storage.disconnect().await;

        assert!(report.drained);
        let content = std::fs::read_to_string(dir.path().join("2026-01-15.db")).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(matches!(
            storage.write(activity()),
            Err(IngestError::QueueClosed)
        ));
    }

    #[tokio::test]
    async fn test_drained_disconnect_closes_primary() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let repository = Arc::new(InMemoryActivityRepository::default());
        let primary: Arc<dyn ActivityRepository> = repository.clone();
        let storage = StorageContext::init(&config(dir.path()), || async move {
            Ok::<_, DomainError>(primary)
        })
        .await
        .unwrap();
        storage.write(activity()).unwrap();

        // Act
        let report = storage.disconnect().await;

        // Assert
        assert!(report.drained);
        assert_eq!(repository.records().len(), 1);
        assert!(repository.is_closed());
    }

    #[tokio::test]
    async fn test_abandoned_disconnect_still_closes_primary() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let repository = Arc::new(FailingActivityRepository::default());
        let primary: Arc<dyn ActivityRepository> = repository.clone();
        let mut config = config(dir.path());
        config.drain_timeout = Duration::from_millis(20);
        let storage = StorageContext::init(&config, || async move {
            Ok::<_, DomainError>(primary)
        })
        .await
        .unwrap();
        let handle = storage.write(activity()).unwrap();

        // Act
        let report = storage.disconnect().await;

        // Assert
        assert!(!report.drained);
        assert_eq!(report.abandoned, 1);
        assert!(!handle.committed().await);
        assert!(repository.is_closed());
    }
}
