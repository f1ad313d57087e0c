//! gitpulse - mirrors GitHub repository metadata and commit history into a
//! relational store and keeps the mirror fresh by periodic polling.
//!
//! # Architecture
//!
//! An external caller publishes `(owner, name)` onto the ingestion
//! [`pipeline`]; the intake stage resolves the repository via the
//! [`github`] client (every call gated by the rate-limit gate), the
//! commit-fetch stage streams paginated history into the [`store`], and the
//! monitor stage enrolls the repository with the [`scheduler`], which
//! re-syncs it every poll interval with bounded [`retry`].
//!
//! # Example
//!
//! ```ignore
//! use gitpulse::github::{CommitWindow, GitHubClient};
//! use gitpulse::scheduler::{PollConfig, PollScheduler};
//! use gitpulse::sync::SyncContext;
//!
//! let db = gitpulse::connect_and_migrate("postgres://localhost/gitpulse").await?;
//! let github = GitHubClient::new("https://api.github.com", &token)?;
//! let (shutdown_handle, shutdown) = gitpulse::shutdown::channel();
//!
//! let ctx = SyncContext { db, github };
//! let scheduler = PollScheduler::new(ctx.clone(), shutdown.clone(), PollConfig::default());
//! let (pipeline, workers) =
//!     gitpulse::pipeline::spawn(ctx, scheduler, shutdown, CommitWindow::default());
//!
//! pipeline.request_monitor("octocat", "hello-world").await?;
//! ```

pub mod db;
pub mod entity;
pub mod github;
pub mod migration;
pub mod pipeline;
pub mod retry;
pub mod scheduler;
pub mod shutdown;
pub mod store;
pub mod sync;

pub use db::{connect, connect_and_migrate};
pub use entity::prelude::*;
pub use github::{CommitWindow, GitHubClient, GitHubError, RateLimitGate};
pub use pipeline::{PipelineClosed, PipelineHandle};
pub use scheduler::{PollConfig, PollScheduler};
pub use store::StoreError;
pub use sync::{SyncContext, SyncError};
