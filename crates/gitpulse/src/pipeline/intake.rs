//! Stage A: repository intake.
//!
//! Resolves `(owner, name)` against the remote API, upserts the repository,
//! and promotes the store-assigned id to the commit-fetch stage. A failed
//! request goes back onto the intake queue with its attempt counter bumped;
//! once the counter reaches the limit the request is dropped.

use tokio::sync::mpsc;

use crate::github::CommitWindow;
use crate::shutdown::Shutdown;
use crate::sync::{self, SyncContext};

use super::{CommitFetchJob, IntakeRequest, MAX_INTAKE_ATTEMPTS};

pub(super) async fn run(
    ctx: SyncContext,
    shutdown: Shutdown,
    mut rx: mpsc::Receiver<IntakeRequest>,
    retry_tx: mpsc::Sender<IntakeRequest>,
    fetch_tx: mpsc::Sender<CommitFetchJob>,
    initial_window: CommitWindow,
) {
    loop {
        let request = tokio::select! {
            _ = shutdown.cancelled() => break,
            request = rx.recv() => match request {
                Some(request) => request,
                None => break,
            },
        };

        match sync::resolve_and_store_repository(&ctx, &request.owner, &request.name).await {
            Ok(repo) => {
                tracing::info!(
                    repo = %repo.full_name(),
                    repo_id = repo.id,
                    "repository resolved, queueing commit fetch"
                );
                let job = CommitFetchJob {
                    repository_id: repo.id,
                    window: initial_window,
                };
                let delivered = tokio::select! {
                    _ = shutdown.cancelled() => break,
                    sent = fetch_tx.send(job) => sent.is_ok(),
                };
                if !delivered {
                    break;
                }
            }
            Err(err) => {
                let attempt = request.attempt + 1;
                if attempt < MAX_INTAKE_ATTEMPTS {
                    tracing::warn!(
                        owner = %request.owner,
                        name = %request.name,
                        attempt,
                        error = %err,
                        "repository intake failed, re-queueing"
                    );
                    let retry = IntakeRequest { attempt, ..request };
                    let delivered = tokio::select! {
                        _ = shutdown.cancelled() => break,
                        sent = retry_tx.send(retry) => sent.is_ok(),
                    };
                    if !delivered {
                        break;
                    }
                } else {
                    tracing::error!(
                        owner = %request.owner,
                        name = %request.name,
                        attempts = attempt,
                        error = %err,
                        "repository intake failed, dropping request"
                    );
                }
            }
        }
    }

    tracing::debug!("intake worker stopped");
}
