use pkgindex_db::PackageStore;
use pkgindex_models::Fork;

/// Determine whether a repository's declared parent is a tracked package.
///
/// The lookup matches on the normalized URL, so casing and a trailing `.git`
/// are irrelevant. A tracked parent yields [`Fork::ParentId`] carrying
/// `parent_url` exactly as given as its fallback; an untracked one yields
/// [`Fork::ParentUrl`]. A failed lookup is logged and treated as untracked.
pub async fn resolve_fork(packages: &PackageStore, parent_url: Option<&str>) -> Option<Fork> {
    let parent_url = parent_url?;
    match packages.find_id_by_url(parent_url).await {
        Ok(Some(id)) => Some(Fork::ParentId {
            id,
            fallback_url: parent_url.to_string(),
        }),
        Ok(None) => Some(Fork::ParentUrl {
            url: parent_url.to_string(),
        }),
        Err(err) => {
            tracing::warn!(parent_url, error = ?err, "Failed to look up fork parent");
            Some(Fork::ParentUrl {
                url: parent_url.to_string(),
            })
        },
    }
}
