//! Schema migrations
//!
//! The SQL files under `migrations/` are compiled in and applied in id order
//! when a store opens. `schema_version` records each applied id with its
//! checksum.

mod checksums;
mod embedded;
mod runner;

pub use runner::{applied_migrations, apply_migrations};
