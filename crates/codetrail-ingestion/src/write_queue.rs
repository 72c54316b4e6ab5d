//! Single-writer commit queue.
//!
//! `add` hands a record to an unbounded channel and returns at once. One
//! worker task drains the channel in FIFO order and commits each record to
//! the sink before looking at the next. A failed commit is retried (same
//! record, with backoff) until it succeeds, so records are never dropped and
//! never reordered.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use codetrail_core::activity::NewActivity;
use codetrail_core::repository::ActivitySink;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::error::IngestError;
use crate::retry::RetryPolicy;

struct PendingWrite {
    activity: NewActivity,
    description: String,
    committed: oneshot::Sender<()>,
}

/// Resolves once the record has been committed.
///
/// Dropping the handle does not cancel the write.
#[derive(Debug)]
pub struct CommitHandle(oneshot::Receiver<()>);

impl CommitHandle {
    /// Waits for the commit. Returns `false` if the record was abandoned at
    /// shutdown.
    pub async fn committed(self) -> bool {
        self.0.await.is_ok()
    }
}

/// Outcome of [`WriteQueue::shutdown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Whether every queued record was committed before the deadline.
    pub drained: bool,
    /// Records still queued (or mid-retry) when the worker was stopped.
    pub abandoned: usize,
}

/// FIFO queue with exactly one in-flight commit.
pub struct WriteQueue {
    sender: Mutex<Option<mpsc::UnboundedSender<PendingWrite>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    depth: Arc<AtomicUsize>,
}

impl WriteQueue {
    /// Starts the worker task. Must be called inside a tokio runtime.
    #[must_use]
    pub fn spawn(sink: Arc<dyn ActivitySink>, policy: RetryPolicy) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let depth = Arc::new(AtomicUsize::new(0));
        let worker = tokio::spawn(run_worker(receiver, sink, policy, Arc::clone(&depth)));
        Self {
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
            depth,
        }
    }

    /// Enqueues a record. Never waits on the sink.
    ///
    /// `description` is what the commit logs mention instead of the record.
    ///
    /// # Errors
    ///
    /// Returns `IngestError::QueueClosed` after [`Self::shutdown`].
    pub fn add(
        &self,
        activity: NewActivity,
        description: String,
    ) -> Result<CommitHandle, IngestError> {
        let (committed, handle) = oneshot::channel();
        let guard = self
            .sender
            .lock()
            .map_err(|_| IngestError::QueueClosed)?;
        let sender = guard.as_ref().ok_or(IngestError::QueueClosed)?;
        self.depth.fetch_add(1, Ordering::SeqCst);
        if sender
            .send(PendingWrite {
                activity,
                description,
                committed,
            })
            .is_err()
        {
            self.depth.fetch_sub(1, Ordering::SeqCst);
            return Err(IngestError::QueueClosed);
        }
        Ok(CommitHandle(handle))
    }

    /// Records accepted but not yet committed.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }

    /// Stops accepting records and drains the backlog, waiting at most
    /// `grace`. Whatever is still queued at the deadline is abandoned.
    pub async fn shutdown(&self, grace: Duration) -> ShutdownReport {
        // Dropping the last sender ends the worker loop once the backlog is empty.
        if let Ok(mut sender) = self.sender.lock() {
            sender.take();
        }
        let worker = self.worker.lock().ok().and_then(|mut worker| worker.take());
        let Some(mut worker) = worker else {
            return ShutdownReport {
                drained: true,
                abandoned: 0,
            };
        };

        if tokio::time::timeout(grace, &mut worker).await.is_ok() {
            info!("write queue drained");
            return ShutdownReport {
                drained: true,
                abandoned: 0,
            };
        }

        worker.abort();
        let _ = worker.await;
        let abandoned = self.depth();
        error!(abandoned, "write queue shutdown deadline passed, abandoning writes");
        ShutdownReport {
            drained: false,
            abandoned,
        }
    }
}

async fn run_worker(
    mut receiver: mpsc::UnboundedReceiver<PendingWrite>,
    sink: Arc<dyn ActivitySink>,
    policy: RetryPolicy,
    depth: Arc<AtomicUsize>,
) {
    while let Some(pending) = receiver.recv().await {
        commit_with_retry(sink.as_ref(), &pending, policy, &depth).await;
        depth.fetch_sub(1, Ordering::SeqCst);
        let _ = pending.committed.send(());
    }
    debug!("write queue worker stopped");
}

async fn commit_with_retry(
    sink: &dyn ActivitySink,
    pending: &PendingWrite,
    policy: RetryPolicy,
    depth: &AtomicUsize,
) {
    let mut attempt: u32 = 0;
    loop {
        match sink.append(&pending.activity).await {
            Ok(()) => {
                debug!(description = %pending.description, attempt, "storage success");
                return;
            }
            Err(e) => {
                let delay = policy.delay_for(attempt);
                error!(
                    description = %pending.description,
                    error = %e,
                    attempt,
                    queue_depth = depth.load(Ordering::SeqCst),
                    retry_in_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "storage failed"
                );
                tokio::time::sleep(delay).await;
                attempt = attempt.saturating_add(1);
            }
        }
    }
}
