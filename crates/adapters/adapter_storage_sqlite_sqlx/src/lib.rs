//! # sprinkler-adapter-storage-sqlite-sqlx
//!
//! `SQLite` local cache adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the `LocalCache` port defined in `sprinkler-app::ports::local_cache`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain types and database rows
//!
//! ## Dependency rule
//! Depends on `sprinkler-app` (for port traits) and `sprinkler-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

mod error;
mod local_cache;
mod pool;

pub use error::StorageError;
pub use local_cache::SqliteLocalCache;
pub use pool::{Config, Database};
