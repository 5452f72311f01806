//! Readme asset cache.
//!
//! Rendered readme HTML (and the private images embedded in it) is copied to
//! the object store, keyed per `(owner, repo)`. Writes only happen when the
//! upstream etag differs from the one recorded in the repository's
//! [`S3Readme`] pointer.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use futures::future::try_join_all;
use pkgindex_hosting::{HostingHandle, ImageToCache, Readme};
use pkgindex_models::S3Readme;
use pkgindex_storage::{Key, Object, StoreHandle};

const HTML_CONTENT_TYPE: &str = "text/html";

/// A freshly fetched readme, and whether it differs from the cached copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedReadme {
    pub readme: Readme,
    /// Upstream etag differs from the cached one (or nothing usable is
    /// cached). Always `false` when upstream supplied no etag.
    pub changed: bool,
}

pub struct ReadmeCache {
    hosting: HostingHandle,
    store: StoreHandle,
}

impl ReadmeCache {
    pub fn new(hosting: HostingHandle, store: StoreHandle) -> Self {
        Self { hosting, store }
    }

    /// Fetch the upstream readme and compare it against `previous`.
    ///
    /// `Ok(None)` means the repository has no readme.
    pub async fn fetch_if_changed(
        &self,
        owner: &str,
        repo: &str,
        previous: Option<&S3Readme>,
    ) -> pkgindex_hosting::error::Result<Option<FetchedReadme>> {
        let Some(readme) = self.hosting.fetch_readme(owner, repo).await? else {
            tracing::debug!(owner, repo, "Repository has no readme");
            return Ok(None);
        };
        let changed = readme.etag.as_deref().is_some_and(|etag| S3Readme::needs_update(previous, etag));
        Ok(Some(FetchedReadme { readme, changed }))
    }

    /// Persist rendered readme HTML, returning the URL it is served from.
    pub async fn store(&self, owner: &str, repo: &str, html: &str) -> Result<String> {
        let key = Key::readme(owner, repo).or_raise(|| ErrorKind::ReadmeCache)?;
        self.store
            .store(&key, html.as_bytes().to_vec(), HTML_CONTENT_TYPE)
            .await
            .or_raise(|| ErrorKind::ReadmeCache)
    }

    /// Copy private images to the cache with a single batched write.
    ///
    /// Images are downloaded concurrently; any failed download fails the
    /// whole batch before anything is written.
    pub async fn store_images(&self, owner: &str, repo: &str, images: &[ImageToCache]) -> Result<()> {
        if images.is_empty() {
            return Ok(());
        }
        let objects = try_join_all(images.iter().map(|image| async move {
            let key = Key::readme_image(owner, repo, &image.file_name).or_raise(|| ErrorKind::ReadmeCache)?;
            let asset = self.hosting.fetch_image(&image.original_url).await.or_raise(|| ErrorKind::ReadmeCache)?;
            Ok::<_, crate::error::Error>(Object {
                key,
                data: asset.data,
                content_type: asset.content_type,
            })
        }))
        .await?;
        self.store.store_many(objects).await.or_raise(|| ErrorKind::ReadmeCache)
    }

    /// Store a changed readme and its images, producing the new pointer.
    ///
    /// Failure degrades to [`S3Readme::Error`] rather than failing ingestion.
    pub async fn cache(&self, owner: &str, repo: &str, readme: &Readme) -> S3Readme {
        let Some(etag) = readme.etag.clone() else {
            return S3Readme::Error {
                message: "readme has no etag".to_string(),
            };
        };
        let stored = async {
            let object_url = self.store(owner, repo, &readme.html).await?;
            self.store_images(owner, repo, &readme.images_to_cache).await?;
            Ok::<_, crate::error::Error>(object_url)
        };
        match stored.await {
            Ok(object_url) => S3Readme::Cached { object_url, etag },
            Err(err) => {
                tracing::warn!(owner, repo, error = ?err, "Failed to cache readme");
                S3Readme::Error {
                    message: format!("{err:?}"),
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkgindex_hosting::MockHosting;
    use pkgindex_hosting::error::ErrorKind as HostingErrorKind;
    use pkgindex_storage::backend::MockStore;
    use std::sync::Arc;

    fn readme(etag: Option<&str>, images: &[&str]) -> Readme {
        Readme {
            etag: etag.map(str::to_string),
            html: "<p>readme</p>".to_string(),
            html_url: Some("https://github.com/foo/bar/blob/main/README.md".to_string()),
            images_to_cache: images
                .iter()
                .map(|name| ImageToCache {
                    original_url: format!("https://private-user-images.githubusercontent.com/1/{name}?jwt=t"),
                    file_name: name.to_string(),
                })
                .collect(),
        }
    }

    fn cache_with(hosting: MockHosting) -> (ReadmeCache, Arc<MockStore>) {
        let store = Arc::new(MockStore::default());
        (ReadmeCache::new(Arc::new(hosting), store.clone()), store)
    }

    #[tokio::test]
    async fn test_fetch_if_changed() {
        let (cache, _) = cache_with(MockHosting::default().with_readme(|_, _| Ok(Some(readme(Some("etag1"), &[])))));
        let cached = |etag: &str| S3Readme::Cached {
            object_url: "url".to_string(),
            etag: etag.to_string(),
        };

        let fetched = cache.fetch_if_changed("foo", "bar", None).await.unwrap().unwrap();
        assert!(fetched.changed);
        let fetched = cache.fetch_if_changed("foo", "bar", Some(&cached("etag1"))).await.unwrap().unwrap();
        assert!(!fetched.changed);
        let fetched = cache.fetch_if_changed("foo", "bar", Some(&cached("etag0"))).await.unwrap().unwrap();
        assert!(fetched.changed);
        let error = S3Readme::Error {
            message: "boom".to_string(),
        };
        let fetched = cache.fetch_if_changed("foo", "bar", Some(&error)).await.unwrap().unwrap();
        assert!(fetched.changed);
    }

    #[tokio::test]
    async fn test_fetch_without_etag_is_never_changed() {
        let (cache, _) = cache_with(MockHosting::default().with_readme(|_, _| Ok(Some(readme(None, &[])))));
        let fetched = cache.fetch_if_changed("foo", "bar", None).await.unwrap().unwrap();
        assert!(!fetched.changed);
    }

    #[tokio::test]
    async fn test_fetch_absent() {
        let (cache, _) = cache_with(MockHosting::default());
        assert_eq!(cache.fetch_if_changed("foo", "bar", None).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_cache_stores_html_and_batches_images() {
        let (cache, store) = cache_with(MockHosting::default());
        let pointer = cache.cache("Foo", "Bar", &readme(Some("etag1"), &["a.png", "b.png"])).await;

        assert_eq!(
            pointer,
            S3Readme::Cached {
                object_url: "mock://mock/foo/bar/readme.html".to_string(),
                etag: "etag1".to_string(),
            }
        );
        assert_eq!(store.store_calls(), 1);
        assert_eq!(store.store_many_calls(), 1);
        let keys: Vec<String> = store.keys().await.iter().map(ToString::to_string).collect();
        assert_eq!(keys, ["foo/bar/a.png", "foo/bar/b.png", "foo/bar/readme.html"]);
    }

    #[tokio::test]
    async fn test_cache_without_images_skips_batch() {
        let (cache, store) = cache_with(MockHosting::default());
        cache.cache("foo", "bar", &readme(Some("etag1"), &[])).await;
        assert_eq!(store.store_calls(), 1);
        assert_eq!(store.store_many_calls(), 0);
    }

    #[tokio::test]
    async fn test_store_failure_degrades_to_error_pointer() {
        let (cache, store) = cache_with(MockHosting::default());
        store.set_failing(true);
        let pointer = cache.cache("foo", "bar", &readme(Some("etag1"), &[])).await;
        assert!(pointer.is_error());
    }

    #[tokio::test]
    async fn test_image_download_failure_writes_no_images() {
        let hosting =
            MockHosting::default().with_image(|_| Err(exn::Exn::from(HostingErrorKind::RequestFailed(403))));
        let (cache, store) = cache_with(hosting);
        let err = cache.store_images("foo", "bar", &readme(None, &["a.png"]).images_to_cache).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::ReadmeCache));
        assert_eq!(store.store_many_calls(), 0);
    }
}
