//! GitHub API client.
//!
//! A thin reqwest wrapper over the REST endpoints gitpulse consumes. The
//! base URL is configurable so tests (and GitHub Enterprise deployments) can
//! point the client elsewhere. Every request is wrapped by the
//! [`RateLimitGate`]: checked before dispatch, updated from the response
//! headers after.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use reqwest::header::{HeaderMap, ACCEPT, USER_AGENT};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use super::error::GitHubError;
use super::rate_limit::RateLimitGate;
use super::types::RepoPayload;

const ACCEPT_VALUE: &str = "application/vnd.github+json";
const USER_AGENT_VALUE: &str = "gitpulse";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Authenticated GitHub API client with a shared rate-limit gate.
#[derive(Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    gate: Arc<RateLimitGate>,
}

impl GitHubClient {
    /// Create a client for `base_url` authenticating with `token`.
    ///
    /// A trailing slash on the base URL is tolerated.
    pub fn new(base_url: &str, token: &str) -> Result<Self, GitHubError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            gate: Arc::new(RateLimitGate::new()),
        })
    }

    /// The rate-limit gate shared by all clones of this client.
    pub fn gate(&self) -> &RateLimitGate {
        &self.gate
    }

    /// Fetch repository metadata: `GET /repos/{owner}/{name}`.
    pub async fn get_repository(&self, owner: &str, name: &str) -> Result<RepoPayload, GitHubError> {
        let path = format!("/repos/{}/{}", owner, name);
        let response = self.get(&path, &[]).await?;
        decode_json(response).await
    }

    /// Issue a gated GET request and map non-success statuses to errors.
    pub(super) async fn get(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<reqwest::Response, GitHubError> {
        self.gate.check()?;

        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .http
            .get(&url)
            .header(ACCEPT, ACCEPT_VALUE)
            .header(USER_AGENT, USER_AGENT_VALUE)
            .bearer_auth(&self.token);
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request.send().await?;
        self.gate.record(response.headers());

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        match status {
            StatusCode::NOT_FOUND => Err(GitHubError::not_found(path)),
            StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
                if let Some(err) = rate_limited_from_headers(response.headers()) {
                    return Err(err);
                }
                Err(api_error(status, response).await)
            }
            _ => Err(api_error(status, response).await),
        }
    }
}

/// Decode a JSON body, mapping read failures to `Transport` and parse
/// failures to `Decode`.
pub(super) async fn decode_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, GitHubError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| GitHubError::Decode(e.to_string()))
}

/// A 403/429 whose headers say the quota is spent is a rate-limit rejection,
/// not a generic API error.
fn rate_limited_from_headers(headers: &HeaderMap) -> Option<GitHubError> {
    let remaining: u64 = headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())?;
    if remaining != 0 {
        return None;
    }

    let reset_at = headers
        .get("x-ratelimit-reset")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<i64>().ok())
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
        .unwrap_or_else(Utc::now);
    let retry_after = (reset_at - Utc::now()).to_std().unwrap_or(Duration::ZERO);

    Some(GitHubError::RateLimited {
        retry_after,
        reset_at,
    })
}

async fn api_error(status: StatusCode, response: reqwest::Response) -> GitHubError {
    let mut message = response.text().await.unwrap_or_default();
    message.truncate(512);
    GitHubError::api(status.as_u16(), message)
}
