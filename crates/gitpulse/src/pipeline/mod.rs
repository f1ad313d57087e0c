//! Three-stage ingestion pipeline.
//!
//! ```text
//! intake queue ──▶ RepoIntake ──▶ commit-fetch queue ──▶ CommitFetch ──▶ monitor queue ──▶ Monitor
//! ```
//!
//! Stages are worker tasks joined by bounded mpsc queues; a full queue blocks
//! the producer (backpressure), and every enqueue/dequeue is raced against
//! the shutdown signal. A repository moves Requested → Resolved → Ingested →
//! Monitored in that order; intake failures are re-queued up to
//! [`MAX_INTAKE_ATTEMPTS`] and then dropped, and a failed commit fetch is
//! never promoted to the monitor stage.

mod commit_fetch;
mod intake;
mod monitor;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::github::CommitWindow;
use crate::scheduler::PollScheduler;
use crate::shutdown::Shutdown;
use crate::sync::SyncContext;

/// Capacity of each inter-stage queue.
pub const QUEUE_CAPACITY: usize = 100;

/// Attempts before an intake request is dropped.
pub const MAX_INTAKE_ATTEMPTS: u32 = 3;

/// A request to start mirroring `(owner, name)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeRequest {
    pub owner: String,
    pub name: String,
    /// Failed attempts so far; always below [`MAX_INTAKE_ATTEMPTS`].
    pub attempt: u32,
}

/// A commit-fetch unit of work for an already-resolved repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitFetchJob {
    pub repository_id: i64,
    pub window: CommitWindow,
}

/// The pipeline rejected new work because its workers have stopped.
#[derive(Debug, Error)]
#[error("ingestion pipeline is not accepting work")]
pub struct PipelineClosed;

/// Clonable write surface of the pipeline, handed to the HTTP layer and the
/// reset operation.
#[derive(Clone)]
pub struct PipelineHandle {
    intake_tx: mpsc::Sender<IntakeRequest>,
    fetch_tx: mpsc::Sender<CommitFetchJob>,
}

impl PipelineHandle {
    /// Publish an intake request for `(owner, name)`.
    ///
    /// Blocks while the intake queue is full.
    pub async fn request_monitor(
        &self,
        owner: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<(), PipelineClosed> {
        self.intake_tx
            .send(IntakeRequest {
                owner: owner.into(),
                name: name.into(),
                attempt: 0,
            })
            .await
            .map_err(|_| PipelineClosed)
    }

    /// Publish a commit-fetch job directly, bypassing intake. Used by the
    /// reset operation, which has already resolved the repository.
    pub async fn request_commit_fetch(&self, job: CommitFetchJob) -> Result<(), PipelineClosed> {
        self.fetch_tx.send(job).await.map_err(|_| PipelineClosed)
    }
}

/// Start the pipeline workers.
///
/// `initial_window` is the commit window applied to repositories entering
/// through intake (the configured start/end dates); incremental windows are
/// computed later by the scheduler.
///
/// Returns the write handle plus the worker join handles, in stage order,
/// for bounded draining at shutdown.
pub fn spawn(
    ctx: SyncContext,
    scheduler: PollScheduler,
    shutdown: Shutdown,
    initial_window: CommitWindow,
) -> (PipelineHandle, Vec<JoinHandle<()>>) {
    let (intake_tx, intake_rx) = mpsc::channel(QUEUE_CAPACITY);
    let (fetch_tx, fetch_rx) = mpsc::channel(QUEUE_CAPACITY);
    let (monitor_tx, monitor_rx) = mpsc::channel(QUEUE_CAPACITY);

    let workers = vec![
        tokio::spawn(intake::run(
            ctx.clone(),
            shutdown.clone(),
            intake_rx,
            intake_tx.clone(),
            fetch_tx.clone(),
            initial_window,
        )),
        tokio::spawn(commit_fetch::run(
            ctx,
            shutdown.clone(),
            fetch_rx,
            monitor_tx,
        )),
        tokio::spawn(monitor::run(scheduler, shutdown, monitor_rx)),
    ];

    (PipelineHandle { intake_tx, fetch_tx }, workers)
}
