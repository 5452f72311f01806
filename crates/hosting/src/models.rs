use pkgindex_models::{FundingLink, License, Release};
use time::UtcDateTime;

/// Repository metadata as reported by the hosting service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub owner: String,
    pub name: String,
    pub owner_name: Option<String>,
    pub owner_avatar_url: Option<String>,
    pub is_in_organization: bool,
    pub default_branch: Option<String>,
    pub summary: Option<String>,
    pub homepage_url: Option<String>,
    pub stars: u32,
    pub forks: u32,
    pub license: License,
    pub open_issues: u32,
    pub open_pull_requests: u32,
    pub issues_closed_at: Vec<UtcDateTime>,
    pub pull_requests_closed_at: Vec<UtcDateTime>,
    /// In the order the repository lists them.
    pub funding_links: Vec<FundingLink>,
    pub topics: Vec<String>,
    pub releases: Vec<Release>,
    /// Clone URL of the repository this one was forked from.
    pub parent_url: Option<String>,
}
impl Metadata {
    /// Metadata with nothing but an owner and a name.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            owner_name: None,
            owner_avatar_url: None,
            is_in_organization: false,
            default_branch: None,
            summary: None,
            homepage_url: None,
            stars: 0,
            forks: 0,
            license: License::None,
            open_issues: 0,
            open_pull_requests: 0,
            issues_closed_at: Vec::new(),
            pull_requests_closed_at: Vec::new(),
            funding_links: Vec::new(),
            topics: Vec::new(),
            releases: Vec::new(),
            parent_url: None,
        }
    }

    pub fn last_issue_closed_at(&self) -> Option<UtcDateTime> {
        self.issues_closed_at.iter().max().copied()
    }

    pub fn last_pull_request_closed_at(&self) -> Option<UtcDateTime> {
        self.pull_requests_closed_at.iter().max().copied()
    }
}

/// Where the repository's license file is shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseInfo {
    pub html_url: Option<String>,
}

/// A private image embedded in a readme, to be copied to the readme cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageToCache {
    pub original_url: String,
    /// Last path segment of the original URL, without the query.
    pub file_name: String,
}

/// A repository's readme rendered to HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Readme {
    /// Change-detection token; a readme without one is never cached.
    pub etag: Option<String>,
    pub html: String,
    pub html_url: Option<String>,
    pub images_to_cache: Vec<ImageToCache>,
}

/// A downloaded binary asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub data: Vec<u8>,
    pub content_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_closed_is_maximum() {
        let at = |s| UtcDateTime::from_unix_timestamp(s).unwrap();
        let mut metadata = Metadata::new("foo", "bar");
        metadata.issues_closed_at = vec![at(0), at(2), at(1)];
        assert_eq!(metadata.last_issue_closed_at(), Some(at(2)));
        assert_eq!(metadata.last_pull_request_closed_at(), None);
    }
}
