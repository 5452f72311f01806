//! SQLite persistence for the package index.
//!
//! Tracks packages through the processing pipeline and stores the metadata
//! each stage derives from them:
//! - **Packages**: a hosted repository URL plus its pipeline stage and status.
//!   The stage and status only ever change together, see [`PackageStore::advance`].
//! - **Repositories**: hosting metadata for a package, at most one per
//!   package, unique by (owner, name) case-insensitively.
//! - **Versions** and **Builds**: the references of a package and the
//!   compatibility builds run against them.

mod db;
pub mod error;
mod models;
mod store;

pub use crate::db::Database;
pub use crate::store::{BuildStore, PackageStore, RepositoryStore};
