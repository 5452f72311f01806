//! Scripted hosting client for testing.

use crate::error::Result;
use crate::{Asset, HostingClient, LicenseInfo, Metadata, Readme};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

type Handler<T> = Box<dyn Fn(&str, &str) -> Result<T> + Send + Sync>;

/// Hosting client answering from closures.
///
/// Defaults: metadata with a summary of `"This is package {owner}/{repo}"`
/// and a `main` default branch, no license, no readme, and a tiny PNG for
/// any image.
///
/// # Examples
///
/// ```
/// use pkgindex_hosting::{HostingClient, MockHosting};
/// use pkgindex_hosting::error::ErrorKind;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let hosting = MockHosting::default().with_metadata(|owner, _| match owner {
///     "broken" => Err(exn::Exn::from(ErrorKind::RequestFailed(400))),
///     _ => Ok(pkgindex_hosting::Metadata::new(owner, "repo")),
/// });
/// assert!(hosting.fetch_metadata("broken", "repo").await.is_err());
/// assert!(hosting.fetch_metadata("fine", "repo").await.is_ok());
/// # }
/// ```
pub struct MockHosting {
    metadata: Handler<Metadata>,
    license: Handler<Option<LicenseInfo>>,
    readme: Handler<Option<Readme>>,
    image: Box<dyn Fn(&str) -> Result<Asset> + Send + Sync>,
    readme_calls: AtomicUsize,
    image_calls: AtomicUsize,
}

impl MockHosting {
    pub fn with_metadata(mut self, f: impl Fn(&str, &str) -> Result<Metadata> + Send + Sync + 'static) -> Self {
        self.metadata = Box::new(f);
        self
    }

    pub fn with_license(
        mut self,
        f: impl Fn(&str, &str) -> Result<Option<LicenseInfo>> + Send + Sync + 'static,
    ) -> Self {
        self.license = Box::new(f);
        self
    }

    pub fn with_readme(mut self, f: impl Fn(&str, &str) -> Result<Option<Readme>> + Send + Sync + 'static) -> Self {
        self.readme = Box::new(f);
        self
    }

    pub fn with_image(mut self, f: impl Fn(&str) -> Result<Asset> + Send + Sync + 'static) -> Self {
        self.image = Box::new(f);
        self
    }

    pub fn readme_calls(&self) -> usize {
        self.readme_calls.load(Ordering::SeqCst)
    }

    pub fn image_calls(&self) -> usize {
        self.image_calls.load(Ordering::SeqCst)
    }
}
impl Default for MockHosting {
    fn default() -> Self {
        Self {
            metadata: Box::new(|owner, repo| {
                let mut metadata = Metadata::new(owner, repo);
                metadata.summary = Some(format!("This is package {owner}/{repo}"));
                metadata.default_branch = Some("main".to_string());
                Ok(metadata)
            }),
            license: Box::new(|_, _| Ok(None)),
            readme: Box::new(|_, _| Ok(None)),
            image: Box::new(|_| {
                Ok(Asset {
                    data: b"\x89PNG".to_vec(),
                    content_type: "image/png".to_string(),
                })
            }),
            readme_calls: AtomicUsize::new(0),
            image_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl HostingClient for MockHosting {
    async fn fetch_metadata(&self, owner: &str, repo: &str) -> Result<Metadata> {
        (self.metadata)(owner, repo)
    }

    async fn fetch_license(&self, owner: &str, repo: &str) -> Result<Option<LicenseInfo>> {
        (self.license)(owner, repo)
    }

    async fn fetch_readme(&self, owner: &str, repo: &str) -> Result<Option<Readme>> {
        self.readme_calls.fetch_add(1, Ordering::SeqCst);
        (self.readme)(owner, repo)
    }

    async fn fetch_image(&self, url: &str) -> Result<Asset> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        (self.image)(url)
    }
}
