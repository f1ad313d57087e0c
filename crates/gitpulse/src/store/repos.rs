//! Repository store operations.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QuerySelect, Set,
};

use crate::entity::repository::{ActiveModel, Column, Entity as Repository, Model};

use super::errors::Result;

/// A repository as resolved from the remote API, ready to be persisted.
///
/// The surrogate `id` is intentionally absent: the store assigns it on first
/// insert and [`upsert`] preserves it on every later write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRepository {
    pub owner: String,
    pub name: String,
    pub description: Option<String>,
    pub url: String,
    pub language: Option<String>,
    pub forks_count: i32,
    pub stargazers_count: i32,
    pub open_issues_count: i32,
    pub watchers_count: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl NewRepository {
    fn into_active_model(self) -> ActiveModel {
        ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            owner: Set(self.owner),
            name: Set(self.name),
            description: Set(self.description),
            url: Set(self.url),
            language: Set(self.language),
            forks_count: Set(self.forks_count),
            stargazers_count: Set(self.stargazers_count),
            open_issues_count: Set(self.open_issues_count),
            watchers_count: Set(self.watchers_count),
            created_at: Set(self.created_at),
            updated_at: Set(self.updated_at),
        }
    }
}

// ─── Operations ──────────────────────────────────────────────────────────────

/// Insert or update a repository keyed on `(owner, name)`.
///
/// If a row with the same natural key exists it is updated in place and keeps
/// its original `id`; otherwise a new row is inserted and the store assigns
/// one. Returns the stored model either way.
pub async fn upsert(db: &DatabaseConnection, repo: NewRepository) -> Result<Model> {
    let existing = find_by_owner_name(db, &repo.owner, &repo.name).await?;

    match existing {
        Some(existing) => {
            let mut model = repo.into_active_model();
            model.id = Set(existing.id);
            Ok(model.update(db).await?)
        }
        None => Ok(repo.into_active_model().insert(db).await?),
    }
}

/// Find a repository by its natural key.
///
/// Generic over the connection so the reset transaction can resolve inside
/// its own scope.
pub async fn find_by_owner_name<C: ConnectionTrait>(
    conn: &C,
    owner: &str,
    name: &str,
) -> Result<Option<Model>> {
    Ok(Repository::find()
        .filter(Column::Owner.eq(owner))
        .filter(Column::Name.eq(name))
        .one(conn)
        .await?)
}

/// Resolve the `(owner, name)` pair for a repository id.
pub async fn owner_and_name(
    db: &DatabaseConnection,
    repo_id: i64,
) -> Result<Option<(String, String)>> {
    let pair = Repository::find_by_id(repo_id)
        .select_only()
        .column(Column::Owner)
        .column(Column::Name)
        .into_tuple::<(String, String)>()
        .one(db)
        .await?;
    Ok(pair)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::db::connect_and_migrate;

    fn new_repo(owner: &str, name: &str, stars: i32) -> NewRepository {
        NewRepository {
            owner: owner.to_string(),
            name: name.to_string(),
            description: Some("a test repository".to_string()),
            url: format!("https://api.github.com/repos/{owner}/{name}"),
            language: Some("Rust".to_string()),
            forks_count: 1,
            stargazers_count: stars,
            open_issues_count: 0,
            watchers_count: stars,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn upsert_assigns_id_on_insert() {
        let db = connect_and_migrate("sqlite::memory:").await.unwrap();

        let saved = upsert(&db, new_repo("octocat", "hello", 10)).await.unwrap();
        assert!(saved.id > 0);
        assert_eq!(saved.owner, "octocat");
        assert_eq!(saved.stargazers_count, 10);
    }

    #[tokio::test]
    async fn upsert_preserves_id_across_updates() {
        let db = connect_and_migrate("sqlite::memory:").await.unwrap();

        let first = upsert(&db, new_repo("octocat", "hello", 10)).await.unwrap();
        let second = upsert(&db, new_repo("octocat", "hello", 25)).await.unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.stargazers_count, 25);

        let all = Repository::find().all(&db).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn owner_and_name_resolves_known_ids() {
        let db = connect_and_migrate("sqlite::memory:").await.unwrap();

        let saved = upsert(&db, new_repo("octocat", "hello", 10)).await.unwrap();
        let pair = owner_and_name(&db, saved.id).await.unwrap();
        assert_eq!(pair, Some(("octocat".to_string(), "hello".to_string())));

        assert_eq!(owner_and_name(&db, saved.id + 1000).await.unwrap(), None);
    }
}
