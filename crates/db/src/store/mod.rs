//! Stores wrapping the connection pool, one per aggregate.
//!
//! Each store is cheap to clone and created from a [`Database`](crate::Database)
//! with `From`, e.g. `PackageStore::from(&db)`.

mod build;
mod package;
mod repository;

pub use self::build::BuildStore;
pub use self::package::PackageStore;
pub use self::repository::RepositoryStore;

fn now() -> i64 {
    time::UtcDateTime::now().unix_timestamp()
}
