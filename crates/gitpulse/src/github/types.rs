//! Wire shapes for the subset of the GitHub REST API that gitpulse consumes.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// `GET /repos/{owner}/{name}` response, reduced to the fields we persist.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoPayload {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub url: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub forks_count: i32,
    #[serde(default)]
    pub stargazers_count: i32,
    #[serde(default)]
    pub open_issues_count: i32,
    #[serde(default)]
    pub watchers_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One element of the `GET /repos/{owner}/{name}/commits` response.
#[derive(Debug, Clone, Deserialize)]
pub struct CommitPayload {
    pub sha: String,
    pub commit: CommitDetail,
}

/// The nested `commit` object carrying message, committer, and URL.
#[derive(Debug, Clone, Deserialize)]
pub struct CommitDetail {
    pub message: String,
    pub committer: CommitSignature,
    pub url: String,
}

/// Committer identity and date.
#[derive(Debug, Clone, Deserialize)]
pub struct CommitSignature {
    pub name: String,
    pub email: String,
    pub date: DateTime<Utc>,
}
