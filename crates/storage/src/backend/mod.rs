//! Object store trait and implementations.

#[cfg(feature = "mock")]
mod mock;
#[cfg(feature = "s3")]
mod s3;

#[cfg(feature = "mock")]
pub use self::mock::MockStore;
#[cfg(feature = "s3")]
pub use self::s3::S3Store;
use crate::Key;
use crate::error::Result;
use async_trait::async_trait;
use futures::future::try_join_all;

/// One object to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Object {
    pub key: Key,
    pub data: Vec<u8>,
    pub content_type: String,
}

/// Write-only interface to the object store backing the readme cache.
///
/// Objects are public once stored; [`store`](Self::store) returns the URL
/// they are served from.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Name of the configured store (logging only).
    fn name(&self) -> &str;

    /// Store (or replace) one object, returning its public URL.
    async fn store(&self, key: &Key, data: Vec<u8>, content_type: &str) -> Result<String>;

    /// Store several objects as one operation.
    ///
    /// Default implementation stores all objects concurrently and fails if
    /// any of them fails.
    async fn store_many(&self, objects: Vec<Object>) -> Result<()> {
        try_join_all(objects.into_iter().map(|object| async move {
            self.store(&object.key, object.data, &object.content_type).await
        }))
        .await?;
        Ok(())
    }
}
