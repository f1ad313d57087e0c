//! Repository entity - the locally mirrored metadata of a GitHub repository.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Repository model - one row per mirrored `(owner, name)` pair.
///
/// The `id` is assigned by the store on first insert and stays stable across
/// upserts; `(owner, name)` is the natural key.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "repositories")]
pub struct Model {
    /// Surrogate primary key, assigned by the database.
    #[sea_orm(primary_key)]
    pub id: i64,

    // ─── Naming ──────────────────────────────────────────────────────────────
    /// Owner login (user or organization).
    pub owner: String,
    /// Repository name.
    pub name: String,

    // ─── Content ─────────────────────────────────────────────────────────────
    /// Repository description.
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    /// API URL of the repository.
    #[sea_orm(column_type = "Text")]
    pub url: String,
    /// Primary programming language.
    pub language: Option<String>,

    // ─── Statistics ──────────────────────────────────────────────────────────
    /// Fork count.
    pub forks_count: i32,
    /// Star count.
    pub stargazers_count: i32,
    /// Open issue count.
    pub open_issues_count: i32,
    /// Watcher count.
    pub watchers_count: i32,

    // ─── Timestamps ──────────────────────────────────────────────────────────
    /// When the repository was created on GitHub.
    pub created_at: DateTimeUtc,
    /// When the repository was last updated on GitHub. Monotonically
    /// non-decreasing across upserts.
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A repository has many commits.
    #[sea_orm(has_many = "super::commit::Entity")]
    Commit,
}

impl Related<super::commit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Commit.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Compute the full name (owner/name).
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn test_full_name() {
        let model = Model {
            id: 1,
            owner: "octocat".to_string(),
            name: "hello-world".to_string(),
            description: None,
            url: "https://api.github.com/repos/octocat/hello-world".to_string(),
            language: Some("Rust".to_string()),
            forks_count: 0,
            stargazers_count: 0,
            open_issues_count: 0,
            watchers_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(model.full_name(), "octocat/hello-world");
    }
}
