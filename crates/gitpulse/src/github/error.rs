//! Error types for the GitHub API adapter.

use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur when talking to the GitHub API.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// The per-token quota is exhausted; no request was dispatched.
    #[error("rate limit exhausted, retry after {}s", retry_after.as_secs())]
    RateLimited {
        /// How long until the quota replenishes.
        retry_after: Duration,
        /// The instant at which the quota replenishes.
        reset_at: DateTime<Utc>,
    },

    /// The requested resource does not exist.
    #[error("not found: {resource}")]
    NotFound { resource: String },

    /// The API answered with a non-success status.
    #[error("github api returned {status}: {message}")]
    Api { status: u16, message: String },

    /// Network-level failure (connect, timeout, TLS).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body did not match the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The operation was cancelled by shutdown.
    #[error("operation cancelled")]
    Cancelled,
}

impl GitHubError {
    /// Create a not found error.
    #[inline]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create an API error from a status code and body.
    #[inline]
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Whether a later attempt could succeed without any intervention.
    ///
    /// Rate-limit exhaustion, transport failures, and server-side errors are
    /// transient; everything else is not.
    #[inline]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Transport(_) => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
