use crate::error::Result;
use crate::{Asset, LicenseInfo, Metadata, Readme};
use async_trait::async_trait;

/// Read access to repositories on the hosting service.
///
/// The three repository calls are independent of each other and may fail
/// independently. Absence of a license or readme is `Ok(None)`, not an
/// error.
#[async_trait]
pub trait HostingClient: Send + Sync {
    async fn fetch_metadata(&self, owner: &str, repo: &str) -> Result<Metadata>;

    async fn fetch_license(&self, owner: &str, repo: &str) -> Result<Option<LicenseInfo>>;

    async fn fetch_readme(&self, owner: &str, repo: &str) -> Result<Option<Readme>>;

    /// Download an image referenced by a readme.
    async fn fetch_image(&self, url: &str) -> Result<Asset>;
}
