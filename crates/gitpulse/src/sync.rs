//! Sync operations shared by the pipeline stages, the poll scheduler, and
//! the reset command.
//!
//! Dependencies are carried in an explicit [`SyncContext`] instead of
//! services holding back-pointers to each other; every operation is a free
//! function over that context.

use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, TransactionTrait};
use thiserror::Error;

use crate::entity::repository::Model as RepositoryModel;
use crate::github::{convert, CommitWindow, GitHubClient, GitHubError};
use crate::pipeline::{CommitFetchJob, PipelineClosed, PipelineHandle};
use crate::shutdown::Shutdown;
use crate::store::{self, StoreError};

/// Shared dependencies for sync operations.
#[derive(Clone)]
pub struct SyncContext {
    pub db: DatabaseConnection,
    pub github: GitHubClient,
}

/// Errors from sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The repository id has no row locally.
    #[error("repository {repo_id} is not tracked")]
    UnknownRepository { repo_id: i64 },

    /// Remote API failure.
    #[error(transparent)]
    Github(#[from] GitHubError),

    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The ingestion pipeline is no longer accepting work.
    #[error(transparent)]
    Pipeline(#[from] PipelineClosed),
}

impl SyncError {
    /// Whether the scheduler's outer retry loop should re-attempt the cycle.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Github(err) if err.is_transient())
    }

    /// Whether this error should surface as a 404.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UnknownRepository { .. }
                | Self::Store(StoreError::NotFound { .. })
                | Self::Github(GitHubError::NotFound { .. })
        )
    }
}

/// Fetch repository metadata from the remote and upsert it locally.
///
/// Used by the intake stage on first observation and by every monitor cycle
/// thereafter; the returned model carries the store-assigned id.
pub async fn resolve_and_store_repository(
    ctx: &SyncContext,
    owner: &str,
    name: &str,
) -> Result<RepositoryModel, SyncError> {
    let payload = ctx.github.get_repository(owner, name).await?;
    let stored = store::repos::upsert(&ctx.db, convert::to_new_repository(owner, &payload)).await?;
    tracing::debug!(
        repo = %stored.full_name(),
        repo_id = stored.id,
        "repository metadata stored"
    );
    Ok(stored)
}

/// Refresh the metadata of an already-tracked repository.
pub async fn sync_repository_metadata(
    ctx: &SyncContext,
    repo_id: i64,
) -> Result<RepositoryModel, SyncError> {
    let (owner, name) = store::repos::owner_and_name(&ctx.db, repo_id)
        .await?
        .ok_or(SyncError::UnknownRepository { repo_id })?;
    resolve_and_store_repository(ctx, &owner, &name).await
}

/// Stream the commit history of `repo_id` within `window` into the store,
/// one page at a time.
///
/// Pages are persisted in page order; a failure on any page aborts the fetch
/// and is returned unchanged. No retry happens here: the next scheduled
/// cycle re-attempts from the same `since`.
pub async fn fetch_and_store_commits(
    ctx: &SyncContext,
    shutdown: &Shutdown,
    repo_id: i64,
    window: CommitWindow,
) -> Result<(), SyncError> {
    let (owner, name) = store::repos::owner_and_name(&ctx.db, repo_id)
        .await?
        .ok_or(SyncError::UnknownRepository { repo_id })?;

    let db = ctx.db.clone();
    ctx.github
        .fetch_commit_pages(shutdown, &owner, &name, window, move |page| {
            let db = db.clone();
            async move {
                let commits = convert::to_new_commits(repo_id, page);
                let count = commits.len();
                store::commits::save(&db, commits).await?;
                tracing::debug!(repo_id, count, "commit page persisted");
                Ok::<(), SyncError>(())
            }
        })
        .await
}

/// The incremental window for a repository: everything after the latest
/// locally known commit date, or unbounded when nothing is stored yet.
pub async fn incremental_window(
    ctx: &SyncContext,
    repo_id: i64,
) -> Result<CommitWindow, SyncError> {
    let latest = store::commits::latest_by_repository(&ctx.db, repo_id).await?;
    Ok(match latest {
        Some(commit) => CommitWindow::since(commit.commit_date),
        None => CommitWindow::default(),
    })
}

/// One monitor cycle: refresh repository metadata, then fetch commits newer
/// than the latest known commit date.
pub async fn sync_cycle(
    ctx: &SyncContext,
    shutdown: &Shutdown,
    repo_id: i64,
) -> Result<(), SyncError> {
    sync_repository_metadata(ctx, repo_id).await?;
    let window = incremental_window(ctx, repo_id).await?;
    fetch_and_store_commits(ctx, shutdown, repo_id, window).await
}

/// Reset a repository's commit window: atomically delete all of its commits,
/// then enqueue a fresh fetch starting at `start_time`.
///
/// The transaction covers only the delete. The refill runs on the pipeline
/// after commit and may interleave with scheduled syncs; the unique `hash`
/// constraint keeps the interleaving idempotent.
pub async fn reset_collection(
    ctx: &SyncContext,
    pipeline: &PipelineHandle,
    owner: &str,
    name: &str,
    start_time: DateTime<Utc>,
) -> Result<(), SyncError> {
    let txn = ctx.db.begin().await.map_err(StoreError::from)?;

    let repo = store::repos::find_by_owner_name(&txn, owner, name)
        .await?
        .ok_or_else(|| StoreError::not_found(format!("repository {owner}/{name}")))?;

    let removed = store::commits::delete_by_repository(&txn, repo.id).await?;
    txn.commit().await.map_err(StoreError::from)?;

    tracing::info!(
        repo = %repo.full_name(),
        repo_id = repo.id,
        removed,
        since = %start_time,
        "commit collection reset, queueing refill"
    );

    pipeline
        .request_commit_fetch(CommitFetchJob {
            repository_id: repo.id,
            window: CommitWindow::since(start_time),
        })
        .await?;

    Ok(())
}
