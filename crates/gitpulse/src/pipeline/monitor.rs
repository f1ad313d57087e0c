//! Stage C: monitor handoff.
//!
//! Terminal stage: registers fully ingested repositories with the poll
//! scheduler. Enrolment is idempotent, so duplicate promotions are harmless.

use tokio::sync::mpsc;

use crate::scheduler::PollScheduler;
use crate::shutdown::Shutdown;

pub(super) async fn run(scheduler: PollScheduler, shutdown: Shutdown, mut rx: mpsc::Receiver<i64>) {
    loop {
        let repo_id = tokio::select! {
            _ = shutdown.cancelled() => break,
            repo_id = rx.recv() => match repo_id {
                Some(repo_id) => repo_id,
                None => break,
            },
        };

        scheduler.enroll(repo_id);
    }

    tracing::debug!("monitor worker stopped");
}
