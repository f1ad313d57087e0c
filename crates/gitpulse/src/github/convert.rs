//! Conversion from GitHub API payloads to store records.

use crate::store::{NewCommit, NewRepository};

use super::types::{CommitPayload, RepoPayload};

/// Convert a repository payload into a store record.
///
/// The owner comes from the request path rather than the payload: the API
/// echoes the canonical owner object, but the mirror is keyed by the name the
/// caller asked to monitor.
pub fn to_new_repository(owner: &str, payload: &RepoPayload) -> NewRepository {
    NewRepository {
        owner: owner.to_string(),
        name: payload.name.clone(),
        description: payload.description.clone(),
        url: payload.url.clone(),
        language: payload.language.clone(),
        forks_count: payload.forks_count,
        stargazers_count: payload.stargazers_count,
        open_issues_count: payload.open_issues_count,
        watchers_count: payload.watchers_count,
        created_at: payload.created_at,
        updated_at: payload.updated_at,
    }
}

/// Convert one page of commit payloads into store records, stamping the
/// owning repository id.
pub fn to_new_commits(repository_id: i64, payloads: Vec<CommitPayload>) -> Vec<NewCommit> {
    payloads
        .into_iter()
        .map(|payload| NewCommit {
            repository_id,
            hash: payload.sha,
            message: payload.commit.message,
            author_name: payload.commit.committer.name,
            author_email: payload.commit.committer.email,
            commit_date: payload.commit.committer.date,
            url: payload.commit.url,
        })
        .collect()
}
