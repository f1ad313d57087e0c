//! Header-driven rate-limit gate.
//!
//! GitHub advertises the per-token quota on every response via
//! `X-RateLimit-Remaining` and `X-RateLimit-Reset` (unix seconds). The gate
//! tracks that state and refuses to dispatch while the quota is exhausted,
//! so a burst of work degrades into a single `RateLimited` error per caller
//! instead of a stream of rejected requests.
//!
//! The gate is constructor-injected into the client; there is no process-wide
//! singleton. The mutex is only held to read or write the two fields, never
//! across I/O.

use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use reqwest::header::HeaderMap;

use super::error::GitHubError;

const REMAINING_HEADER: &str = "x-ratelimit-remaining";
const RESET_HEADER: &str = "x-ratelimit-reset";

/// Last-observed quota state for one token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimitState {
    /// Requests left in the current window. `None` until first observed.
    pub remaining: Option<u64>,
    /// When the window resets. `None` until first observed.
    pub reset_at: Option<DateTime<Utc>>,
}

impl RateLimitState {
    /// Whether the quota is exhausted as of `now`.
    fn exhausted_until(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match (self.remaining, self.reset_at) {
            (Some(0), Some(reset_at)) if reset_at > now => Some(reset_at),
            _ => None,
        }
    }
}

/// Serializes awareness of the remote's per-token quota.
#[derive(Debug, Default)]
pub struct RateLimitGate {
    state: Mutex<RateLimitState>,
}

impl RateLimitGate {
    /// Create a gate with no observed state; the first request always passes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deny-before-dispatch check.
    ///
    /// Fails with [`GitHubError::RateLimited`] when the last-observed quota is
    /// zero and the reset instant is still in the future. The caller must not
    /// issue the request in that case.
    pub fn check(&self) -> Result<(), GitHubError> {
        let now = Utc::now();
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(reset_at) = state.exhausted_until(now) {
            let retry_after = (reset_at - now).to_std().unwrap_or(Duration::ZERO);
            return Err(GitHubError::RateLimited {
                retry_after,
                reset_at,
            });
        }
        Ok(())
    }

    /// Record quota headers from a response.
    ///
    /// A header that is absent or unparsable leaves the corresponding field
    /// unchanged.
    pub fn record(&self, headers: &HeaderMap) {
        let remaining = header_u64(headers, REMAINING_HEADER);
        let reset_at = header_u64(headers, RESET_HEADER)
            .and_then(|secs| Utc.timestamp_opt(secs as i64, 0).single());

        if remaining.is_none() && reset_at.is_none() {
            return;
        }

        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if remaining.is_some() {
            state.remaining = remaining;
        }
        if reset_at.is_some() {
            state.reset_at = reset_at;
        }
    }

    /// Current state, for logging and diagnostics.
    pub fn snapshot(&self) -> RateLimitState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}
