//! Commit store operations.
//!
//! Writes are generic over [`ConnectionTrait`] so the reset operation can run
//! them inside its transaction.

use sea_orm::sea_query::{Alias, Expr, OnConflict};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, FromQueryResult,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::Serialize;

use crate::entity::commit::{ActiveModel, Column, Entity as Commit, Model};
use crate::store::repos;

use super::errors::Result;

/// A commit converted from the remote API, ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCommit {
    pub repository_id: i64,
    pub hash: String,
    pub message: String,
    pub author_name: String,
    pub author_email: String,
    pub commit_date: chrono::DateTime<chrono::Utc>,
    pub url: String,
}

impl NewCommit {
    fn into_active_model(self) -> ActiveModel {
        ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            repository_id: Set(self.repository_id),
            hash: Set(self.hash),
            message: Set(self.message),
            author_name: Set(self.author_name),
            author_email: Set(self.author_email),
            commit_date: Set(self.commit_date),
            url: Set(self.url),
        }
    }
}

/// Aggregate row for the top-authors query.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct CommitAuthor {
    pub author_name: String,
    pub author_email: String,
    pub commit_count: i64,
}

// ─── Operations ──────────────────────────────────────────────────────────────

/// Bulk-insert commits. Rows whose `hash` already exists are silently
/// skipped, so re-delivering a page is a successful no-op.
pub async fn save<C: ConnectionTrait>(conn: &C, commits: Vec<NewCommit>) -> Result<()> {
    if commits.is_empty() {
        return Ok(());
    }

    Commit::insert_many(commits.into_iter().map(NewCommit::into_active_model))
        .on_conflict(OnConflict::column(Column::Hash).do_nothing().to_owned())
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

/// The commit with the maximum `commit_date` for a repository, if any.
/// Ordering ties are broken arbitrarily.
pub async fn latest_by_repository(
    db: &DatabaseConnection,
    repo_id: i64,
) -> Result<Option<Model>> {
    Ok(Commit::find()
        .filter(Column::RepositoryId.eq(repo_id))
        .order_by_desc(Column::CommitDate)
        .one(db)
        .await?)
}

/// List a repository's commits by natural key, newest first.
///
/// Returns the requested page plus the total row count. An unknown
/// repository yields an empty page.
pub async fn list_by_repository_name(
    db: &DatabaseConnection,
    owner: &str,
    name: &str,
    page: u64,
    page_size: u64,
) -> Result<(Vec<Model>, u64)> {
    let Some(repo) = repos::find_by_owner_name(db, owner, name).await? else {
        return Ok((Vec::new(), 0));
    };

    let paginator = Commit::find()
        .filter(Column::RepositoryId.eq(repo.id))
        .order_by_desc(Column::CommitDate)
        .paginate(db, page_size.max(1));

    let total = paginator.num_items().await?;
    let items = paginator.fetch_page(page.max(1) - 1).await?;
    Ok((items, total))
}

/// Delete every commit of a repository. Returns the number of rows removed.
pub async fn delete_by_repository<C: ConnectionTrait>(conn: &C, repo_id: i64) -> Result<u64> {
    let result = Commit::delete_many()
        .filter(Column::RepositoryId.eq(repo_id))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

/// Top `limit` commit authors of a repository, grouped by name and email,
/// ordered by commit count descending.
pub async fn top_authors(
    db: &DatabaseConnection,
    repo_id: i64,
    limit: u64,
) -> Result<Vec<CommitAuthor>> {
    let authors = Commit::find()
        .select_only()
        .column(Column::AuthorName)
        .column(Column::AuthorEmail)
        .column_as(Column::Id.count(), "commit_count")
        .filter(Column::RepositoryId.eq(repo_id))
        .group_by(Column::AuthorName)
        .group_by(Column::AuthorEmail)
        .order_by_desc(Expr::col(Alias::new("commit_count")))
        .limit(limit)
        .into_model::<CommitAuthor>()
        .all(db)
        .await?;
    Ok(authors)
}
