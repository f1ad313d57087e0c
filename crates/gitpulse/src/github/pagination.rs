//! Paged fetching over RFC 5988 `Link` headers.
//!
//! GitHub paginates list endpoints and advertises the next page via a `Link`
//! header segment with `rel="next"`. [`GitHubClient::fetch_pages`] walks that
//! chain lazily: each page is decoded and handed to an async `emit` callback
//! before the next page is requested, so persistence overlaps with fetching
//! and no more than one page is buffered at a time.

use std::future::Future;

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;

use super::client::{decode_json, GitHubClient};
use super::error::GitHubError;
use super::types::CommitPayload;
use crate::shutdown::Shutdown;

/// Page size used for every paginated request.
pub const PER_PAGE: u32 = 100;

/// Time window for a commit fetch. Both bounds are optional; an absent
/// `since` means "from the beginning", an absent `until` means "up to now".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitWindow {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl CommitWindow {
    /// Window starting at `since` with no upper bound (incremental sync).
    pub fn since(since: DateTime<Utc>) -> Self {
        Self {
            since: Some(since),
            until: None,
        }
    }
}

/// Parse a `Link` header and report whether a `rel="next"` segment exists.
///
/// GitHub Link headers look like:
/// `<https://api.github.com/repos/o/r/commits?page=2>; rel="next", <...&page=9>; rel="last"`
pub fn has_next_page(link_header: &str) -> bool {
    for part in link_header.split(',') {
        let mut segments = part.split(';');
        let Some(url) = segments.next() else {
            continue;
        };
        if url.trim().is_empty() {
            continue;
        }
        for segment in segments {
            let segment = segment.trim();
            if let Some(rel) = segment.strip_prefix("rel=") {
                if rel.trim_matches('"') == "next" {
                    return true;
                }
            }
        }
    }
    false
}

fn headers_have_next(headers: &HeaderMap) -> bool {
    headers
        .get("link")
        .and_then(|v| v.to_str().ok())
        .map(has_next_page)
        .unwrap_or(false)
}

impl GitHubClient {
    /// Fetch every page of a paginated endpoint, invoking `emit` per page.
    ///
    /// Iteration starts at `page=1` with `per_page=100` and terminates when
    /// the response carries no `rel="next"` link. Errors from the request,
    /// the body decode, or `emit` end the iteration and are returned
    /// verbatim; cancellation is checked between pages. The error type is
    /// the caller's, so a persistence sink can fail with its own error
    /// without wrapping.
    pub async fn fetch_pages<T, E, F, Fut>(
        &self,
        shutdown: &Shutdown,
        path: &str,
        params: &[(&str, String)],
        mut emit: F,
    ) -> Result<(), E>
    where
        T: DeserializeOwned,
        E: From<GitHubError>,
        F: FnMut(Vec<T>) -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        let mut page = 1u32;
        loop {
            if shutdown.is_cancelled() {
                return Err(E::from(GitHubError::Cancelled));
            }

            let mut query: Vec<(&str, String)> = params.to_vec();
            query.push(("page", page.to_string()));
            query.push(("per_page", PER_PAGE.to_string()));

            let response = self.get(path, &query).await.map_err(E::from)?;
            let more = headers_have_next(response.headers());
            let items: Vec<T> = decode_json(response).await.map_err(E::from)?;

            emit(items).await?;

            if !more {
                return Ok(());
            }
            page += 1;
        }
    }

    /// Fetch the commit history of a repository within `window`, page by
    /// page: `GET /repos/{owner}/{name}/commits?since=&until=&page=&per_page=100`.
    pub async fn fetch_commit_pages<E, F, Fut>(
        &self,
        shutdown: &Shutdown,
        owner: &str,
        name: &str,
        window: CommitWindow,
        emit: F,
    ) -> Result<(), E>
    where
        E: From<GitHubError>,
        F: FnMut(Vec<CommitPayload>) -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        let path = format!("/repos/{}/{}/commits", owner, name);
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(since) = window.since {
            params.push(("since", rfc3339(since)));
        }
        if let Some(until) = window.until {
            params.push(("until", rfc3339(until)));
        }

        self.fetch_pages(shutdown, &path, &params, emit).await
    }
}

fn rfc3339(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}
