//! Database entities for the gitpulse schema.

pub mod commit;
pub mod prelude;
pub mod repository;
