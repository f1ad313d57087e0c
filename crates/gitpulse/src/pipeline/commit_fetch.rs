//! Stage B: commit fetch.
//!
//! Streams the commit history of a resolved repository into the store, page
//! by page, then promotes the repository to the monitor stage. On any fetch
//! or save error the id is NOT promoted: the monitor stage must never learn
//! of a half-ingested repository. The next cycle (or a fresh request) retries
//! from the same window.

use tokio::sync::mpsc;

use crate::shutdown::Shutdown;
use crate::sync::{self, SyncContext};

use super::CommitFetchJob;

pub(super) async fn run(
    ctx: SyncContext,
    shutdown: Shutdown,
    mut rx: mpsc::Receiver<CommitFetchJob>,
    monitor_tx: mpsc::Sender<i64>,
) {
    loop {
        let job = tokio::select! {
            _ = shutdown.cancelled() => break,
            job = rx.recv() => match job {
                Some(job) => job,
                None => break,
            },
        };

        let repo_id = job.repository_id;
        match sync::fetch_and_store_commits(&ctx, &shutdown, repo_id, job.window).await {
            Ok(()) => {
                tracing::info!(repo_id, "commit history ingested, promoting to monitor");
                let delivered = tokio::select! {
                    _ = shutdown.cancelled() => break,
                    sent = monitor_tx.send(repo_id) => sent.is_ok(),
                };
                if !delivered {
                    break;
                }
            }
            Err(err) => {
                tracing::error!(repo_id, error = %err, "commit ingestion failed");
            }
        }
    }

    tracing::debug!("commit fetch worker stopped");
}
