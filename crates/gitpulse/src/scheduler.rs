//! Per-repository poll scheduler.
//!
//! Every monitored repository gets its own timer task firing every
//! `PollConfig::interval`. A tick runs one [`sync_cycle`] (metadata refresh
//! plus incremental commit fetch) wrapped in the bounded exponential retry;
//! because the cycle runs inline in that repository's tick loop, two cycles
//! for the same repository can never overlap. Ticks missed while a cycle (or
//! its backoff) is still running are coalesced rather than burst.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::retry::with_retry;
use crate::shutdown::Shutdown;
use crate::sync::{self, SyncContext, SyncError};

/// Poll timing and retry bounds.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Period between sync cycles per repository.
    pub interval: Duration,
    /// Attempts per cycle before giving up until the next tick.
    pub max_retries: u32,
    /// Base delay of the exponential backoff between attempts.
    pub initial_backoff: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3600),
            max_retries: 3,
            initial_backoff: Duration::from_secs(2),
        }
    }
}

/// Registry of one periodic sync task per monitored repository.
#[derive(Clone)]
pub struct PollScheduler {
    inner: Arc<Inner>,
}

struct Inner {
    ctx: SyncContext,
    shutdown: Shutdown,
    config: PollConfig,
    entries: Mutex<HashMap<i64, JoinHandle<()>>>,
}

impl PollScheduler {
    /// Create a scheduler with no entries.
    pub fn new(ctx: SyncContext, shutdown: Shutdown, config: PollConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                ctx,
                shutdown,
                config,
                entries: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Register a repository for periodic sync. Idempotent: re-enrolling an
    /// already-scheduled repository is a no-op.
    pub fn enroll(&self, repo_id: i64) {
        let mut entries = self.inner.entries.lock().unwrap_or_else(|e| e.into_inner());
        if entries.contains_key(&repo_id) {
            tracing::debug!(repo_id, "repository already enrolled");
            return;
        }

        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(poll_loop(inner, repo_id));
        entries.insert(repo_id, handle);
        tracing::info!(repo_id, "repository enrolled for periodic sync");
    }

    /// Whether a repository is currently enrolled.
    pub fn is_enrolled(&self, repo_id: i64) -> bool {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(&repo_id)
    }

    /// Number of enrolled repositories.
    pub fn enrolled_count(&self) -> usize {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Abort every timer task. Called after shutdown has been signalled and
    /// in-flight cycles have had their chance to drain.
    pub fn abort_all(&self) {
        let mut entries = self.inner.entries.lock().unwrap_or_else(|e| e.into_inner());
        for (_, handle) in entries.drain() {
            handle.abort();
        }
    }
}

async fn poll_loop(inner: Arc<Inner>, repo_id: i64) {
    let mut interval = tokio::time::interval(inner.config.interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick of a tokio interval completes immediately; the initial
    // ingest has already run by enrolment time, so skip it.
    interval.tick().await;

    loop {
        tokio::select! {
            _ = inner.shutdown.cancelled() => break,
            _ = interval.tick() => {
                run_cycle(&inner, repo_id).await;
            }
        }
    }

    tracing::debug!(repo_id, "poll loop stopped");
}

async fn run_cycle(inner: &Inner, repo_id: i64) {
    let result = with_retry(
        inner.config.max_retries,
        inner.config.initial_backoff,
        &inner.shutdown,
        || sync::sync_cycle(&inner.ctx, &inner.shutdown, repo_id),
        SyncError::is_transient,
    )
    .await;

    match result {
        Ok(()) => tracing::debug!(repo_id, "sync cycle completed"),
        Err(err) => {
            // The next tick resumes normally; nothing is unscheduled.
            tracing::error!(repo_id, error = %err, "sync cycle failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_and_migrate;
    use crate::github::GitHubClient;
    use crate::shutdown;

    async fn test_scheduler() -> (PollScheduler, crate::shutdown::ShutdownHandle) {
        let db = connect_and_migrate("sqlite::memory:").await.unwrap();
        let github = GitHubClient::new("http://127.0.0.1:9", "test-token").unwrap();
        let (handle, shutdown) = shutdown::channel();
        let scheduler = PollScheduler::new(
            SyncContext { db, github },
            shutdown,
            PollConfig {
                interval: Duration::from_secs(3600),
                ..PollConfig::default()
            },
        );
        (scheduler, handle)
    }

    #[tokio::test]
    async fn enroll_is_idempotent() {
        let (scheduler, handle) = test_scheduler().await;

        assert!(!scheduler.is_enrolled(7));
        scheduler.enroll(7);
        scheduler.enroll(7);
        scheduler.enroll(8);

        assert!(scheduler.is_enrolled(7));
        assert_eq!(scheduler.enrolled_count(), 2);

        handle.shutdown();
        scheduler.abort_all();
        assert_eq!(scheduler.enrolled_count(), 0);
    }
}
