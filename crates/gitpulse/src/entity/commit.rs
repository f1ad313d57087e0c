//! Commit entity - one immutable row per ingested commit.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Commit model. The `hash` is globally unique; rows are written once and
/// never updated, only mass-deleted by the reset operation.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "commits")]
pub struct Model {
    /// Surrogate primary key, assigned by the database.
    #[sea_orm(primary_key)]
    #[serde(skip_serializing, default)]
    pub id: i64,
    /// Owning repository.
    #[serde(skip_serializing, default)]
    pub repository_id: i64,
    /// Content-addressed commit identifier.
    #[sea_orm(unique)]
    pub hash: String,
    /// Commit message.
    #[sea_orm(column_type = "Text")]
    pub message: String,
    /// Committer name.
    pub author_name: String,
    /// Committer email.
    pub author_email: String,
    /// Committer date.
    pub commit_date: DateTimeUtc,
    /// API URL of the commit.
    #[sea_orm(column_type = "Text")]
    pub url: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A commit belongs to a repository.
    #[sea_orm(
        belongs_to = "super::repository::Entity",
        from = "Column::RepositoryId",
        to = "super::repository::Column::Id"
    )]
    Repository,
}

impl Related<super::repository::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Repository.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
