use crate::{Id, License};
use serde::{Deserialize, Serialize};
use time::UtcDateTime;

/// Where a forked repository came from.
///
/// Absence of a fork is modelled as `Option::<Fork>::None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Fork {
    /// The parent is itself a tracked package. The id is the join key; the
    /// fallback URL is display data only, for when the parent package is
    /// later removed.
    #[serde(rename_all = "camelCase")]
    ParentId { id: Id, fallback_url: String },
    /// The parent is not tracked.
    ParentUrl { url: String },
}

/// Pointer to the cached copy of a repository's rendered readme.
///
/// Absence (never cached) is modelled as `Option::<S3Readme>::None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum S3Readme {
    #[serde(rename_all = "camelCase")]
    Cached { object_url: String, etag: String },
    Error { message: String },
}
impl S3Readme {
    /// Whether the upstream readme must be (re-)stored.
    ///
    /// Only a cached copy with an identical etag is considered fresh.
    pub fn needs_update(this: Option<&S3Readme>, upstream_etag: &str) -> bool {
        match this {
            Some(Self::Cached { etag, .. }) => etag != upstream_etag,
            Some(Self::Error { .. }) | None => true,
        }
    }

    pub fn etag(&self) -> Option<&str> {
        match self {
            Self::Cached { etag, .. } => Some(etag),
            Self::Error { .. } => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FundingPlatform {
    CommunityBridge,
    Custom,
    GitHub,
    IssueHunt,
    KoFi,
    LfxCrowdfunding,
    Liberapay,
    OpenCollective,
    Otechie,
    Patreon,
    Tidelift,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingLink {
    pub platform: FundingPlatform,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub description: Option<String>,
    pub description_html: Option<String>,
    pub is_draft: bool,
    pub published_at: Option<UtcDateTime>,
    pub tag_name: String,
    pub url: String,
}

/// Hosted repository metadata for a [`Package`](crate::Package).
///
/// Owned by, and destroyed with, its package. Every successful ingestion pass
/// overwrites all fields with freshly fetched values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub id: Id,
    pub package_id: Id,
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
    pub license_url: Option<String>,
    pub open_issues: u32,
    pub open_pull_requests: u32,
    pub last_issue_closed_at: Option<UtcDateTime>,
    pub last_pull_request_closed_at: Option<UtcDateTime>,
    pub funding_links: Vec<FundingLink>,
    pub keywords: Vec<String>,
    pub releases: Vec<Release>,
    pub readme_html_url: Option<String>,
    pub s3_readme: Option<S3Readme>,
    pub forked_from: Option<Fork>,
}
impl Repository {
    /// An empty repository record for `package_id`, to be filled in by
    /// ingestion.
    pub fn new(package_id: Id) -> Self {
        Self {
            id: Id::new_v4(),
            package_id,
            owner: String::new(),
            name: String::new(),
            owner_name: None,
            owner_avatar_url: None,
            is_in_organization: false,
            default_branch: None,
            summary: None,
            homepage_url: None,
            stars: 0,
            forks: 0,
            license: License::None,
            license_url: None,
            open_issues: 0,
            open_pull_requests: 0,
            last_issue_closed_at: None,
            last_pull_request_closed_at: None,
            funding_links: Vec::new(),
            keywords: Vec::new(),
            releases: Vec::new(),
            readme_html_url: None,
            s3_readme: None,
            forked_from: None,
        }
    }

    /// Case-fold, de-duplicate and sort keywords for storage.
    pub fn normalize_keywords(keywords: impl IntoIterator<Item = impl AsRef<str>>) -> Vec<String> {
        let mut keywords: Vec<String> = keywords.into_iter().map(|k| k.as_ref().to_lowercase()).collect();
        keywords.sort();
        keywords.dedup();
        keywords
    }

    /// A blank homepage (after trimming) is no homepage at all.
    pub fn normalize_homepage(url: Option<&str>) -> Option<String> {
        url.map(str::trim).filter(|u| !u.is_empty()).map(str::to_string)
    }
}
