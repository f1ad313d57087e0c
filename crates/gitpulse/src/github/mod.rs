//! GitHub API adapter: client, rate-limit gate, paged fetching, conversion.

pub mod client;
pub mod convert;
pub mod error;
pub mod pagination;
pub mod rate_limit;
pub mod types;

pub use client::GitHubClient;
pub use error::GitHubError;
pub use pagination::{CommitWindow, PER_PAGE};
pub use rate_limit::{RateLimitGate, RateLimitState};
pub use types::{CommitPayload, RepoPayload};
