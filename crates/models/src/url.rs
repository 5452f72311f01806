//! Repository URL handling.
//!
//! Every identity comparison between package URLs goes through
//! [`normalize_url`], so that `https://github.com/Foo/Bar` and
//! `https://github.com/foo/bar.git` are recognised as the same repository.

use crate::error::{ErrorKind, Result};
use exn::OptionExt;

const GIT_SUFFIX: &str = ".git";
const HOSTING_HOST: &str = "github.com";

/// Normalize a repository URL for identity comparisons.
///
/// Lower-cases the whole URL, strips surrounding whitespace and trailing
/// slashes, and ensures a single `.git` suffix.
///
/// ```
/// use pkgindex_models::normalize_url;
/// assert_eq!(normalize_url("https://github.com/Foo/Parent"), "https://github.com/foo/parent.git");
/// assert_eq!(normalize_url("https://github.com/foo/parent.git/"), "https://github.com/foo/parent.git");
/// ```
pub fn normalize_url(url: impl AsRef<str>) -> String {
    let lower = url.as_ref().trim().trim_end_matches('/').to_lowercase();
    if lower.ends_with(GIT_SUFFIX) {
        lower
    } else {
        format!("{lower}{GIT_SUFFIX}")
    }
}

/// Derive the `(owner, repository)` pair from a hosted repository URL.
///
/// Case is preserved; a trailing `.git` is removed from the repository name.
/// The URL must point at exactly one repository on the hosting service.
pub fn owner_repository(url: impl AsRef<str>) -> Result<(String, String)> {
    let url = url.as_ref();
    let invalid = || ErrorKind::InvalidUrl(url.to_string());
    let without_scheme = url
        .trim()
        .strip_prefix("https://")
        .or_else(|| url.trim().strip_prefix("http://"))
        .ok_or_raise(invalid)?;
    let mut segments = without_scheme.trim_end_matches('/').split('/');
    let host = segments.next().unwrap_or_default();
    if !host.eq_ignore_ascii_case(HOSTING_HOST) {
        exn::bail!(invalid());
    }
    let (Some(owner), Some(repository), None) = (segments.next(), segments.next(), segments.next()) else {
        exn::bail!(invalid());
    };
    let repository = repository.strip_suffix(GIT_SUFFIX).unwrap_or(repository);
    if owner.is_empty() || repository.is_empty() {
        exn::bail!(invalid());
    }
    Ok((owner.to_string(), repository.to_string()))
}
