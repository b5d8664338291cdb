//! # macrohub-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the `MacroStore` port trait defined in `macrohub-app`
//! - Manage the `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain types and database rows
//!
//! ## Dependency rule
//! Depends on `macrohub-app` (for port traits) and `macrohub-domain` (for
//! domain types). The `app` and `domain` crates must never reference this
//! adapter.

pub mod error;
pub mod macro_repo;
pub mod pool;

pub use error::StorageError;
pub use macro_repo::SqliteMacroStore;
pub use pool::{Config, Database};
