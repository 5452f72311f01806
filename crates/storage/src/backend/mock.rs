//! In-memory object store for testing.

use crate::backend::{Object, ObjectStore};
use crate::error::{ErrorKind, Result};
use crate::Key;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// In-memory object store for testing.
///
/// Objects are kept in a `HashMap` behind a [`RwLock`]. Calls to
/// [`store`](ObjectStore::store) and [`store_many`](ObjectStore::store_many)
/// are counted separately so tests can assert how often (and how) the store
/// was written to.
///
/// # Examples
///
/// ```
/// use pkgindex_storage::backend::MockStore;
/// use pkgindex_storage::{Key, ObjectStore};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MockStore::default();
/// let key = Key::readme("Foo", "Bar")?;
/// let url = store.store(&key, b"<p>hello</p>".to_vec(), "text/html").await?;
/// assert_eq!(url, "mock://mock/foo/bar/readme.html");
/// assert_eq!(store.store_calls(), 1);
/// # Ok(())
/// # }
/// ```
pub struct MockStore {
    name: String,
    objects: RwLock<HashMap<Key, (String, Vec<u8>)>>,
    store_calls: AtomicUsize,
    store_many_calls: AtomicUsize,
    failing: AtomicBool,
}

impl MockStore {
    /// Change the name of the mock store.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Make every subsequent write fail with [`ErrorKind::BackendError`].
    pub fn failing(self) -> Self {
        self.failing.store(true, Ordering::SeqCst);
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn url_for(&self, key: &Key) -> String {
        format!("mock://{}/{key}", self.name)
    }

    /// Stored data and content type of an object.
    pub async fn get(&self, key: &Key) -> Option<(String, Vec<u8>)> {
        self.objects.read().await.get(key).cloned()
    }

    /// All stored keys, sorted.
    pub async fn keys(&self) -> Vec<Key> {
        let mut keys: Vec<Key> = self.objects.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn store_calls(&self) -> usize {
        self.store_calls.load(Ordering::SeqCst)
    }

    pub fn store_many_calls(&self) -> usize {
        self.store_many_calls.load(Ordering::SeqCst)
    }

    fn check_failing(&self) -> Result<()> {
        match self.failing.load(Ordering::SeqCst) {
            true => exn::bail!(ErrorKind::BackendError("mock store is failing".to_string())),
            false => Ok(()),
        }
    }
}
impl Default for MockStore {
    fn default() -> Self {
        Self {
            name: "mock".to_string(),
            objects: RwLock::new(HashMap::new()),
            store_calls: AtomicUsize::new(0),
            store_many_calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl ObjectStore for MockStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn store(&self, key: &Key, data: Vec<u8>, content_type: &str) -> Result<String> {
        self.store_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failing()?;
        self.objects.write().await.insert(key.clone(), (content_type.to_string(), data));
        Ok(self.url_for(key))
    }

    async fn store_many(&self, objects: Vec<Object>) -> Result<()> {
        self.store_many_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failing()?;
        let mut guard = self.objects.write().await;
        for object in objects {
            guard.insert(object.key, (object.content_type, object.data));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_and_get() {
        let store = MockStore::default().with_name("readmes");
        let key = Key::readme("foo", "bar").unwrap();
        let url = store.store(&key, b"html".to_vec(), "text/html").await.unwrap();
        assert_eq!(url, "mock://readmes/foo/bar/readme.html");
        assert_eq!(store.get(&key).await, Some(("text/html".to_string(), b"html".to_vec())));
    }

    #[tokio::test]
    async fn test_store_many_is_one_call() {
        let store = MockStore::default();
        let objects = ["a.png", "b.png"]
            .into_iter()
            .map(|name| Object {
                key: Key::readme_image("foo", "bar", name).unwrap(),
                data: name.as_bytes().to_vec(),
                content_type: "image/png".to_string(),
            })
            .collect();
        store.store_many(objects).await.unwrap();
        assert_eq!(store.store_many_calls(), 1);
        assert_eq!(store.store_calls(), 0);
        assert_eq!(store.keys().await.len(), 2);
    }

    #[tokio::test]
    async fn test_failing() {
        let store = MockStore::default().failing();
        let key = Key::readme("foo", "bar").unwrap();
        let err = store.store(&key, Vec::new(), "text/html").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::BackendError(_)));
        assert!(store.keys().await.is_empty());
        // Failed calls are still counted.
        assert_eq!(store.store_calls(), 1);
    }
}
