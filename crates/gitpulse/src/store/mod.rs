//! Durable storage over the gitpulse entities.
//!
//! Free async functions over a sea-orm connection, split by entity:
//!
//! - [`repos`] - upsert-by-natural-key and lookups
//! - [`commits`] - hash-deduplicated bulk insert, listings, aggregates, reset
//!   support
//!
//! Invariants enforced here: an upsert on an existing `(owner, name)` keeps
//! the original `id`; a commit save that collides entirely on existing hashes
//! is a successful no-op.

pub mod commits;
pub mod errors;
pub mod repos;

pub use commits::{CommitAuthor, NewCommit};
pub use errors::{Result, StoreError};
pub use repos::NewRepository;
