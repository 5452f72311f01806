use crate::error::{Error, ErrorKind};
use crate::models::{from_json, parse_id, parse_timestamp, to_json};
use exn::ResultExt;
use pkgindex_models::{Fork, FundingLink, License, Release, Repository, S3Readme};
use serde::{Deserialize, Serialize};

/// JSON shape of a stored release; dates as unix timestamps like every other
/// column.
#[derive(Serialize, Deserialize)]
struct ReleaseJson {
    description: Option<String>,
    description_html: Option<String>,
    is_draft: bool,
    published_at: Option<i64>,
    tag_name: String,
    url: String,
}
impl From<&Release> for ReleaseJson {
    fn from(release: &Release) -> Self {
        Self {
            description: release.description.clone(),
            description_html: release.description_html.clone(),
            is_draft: release.is_draft,
            published_at: release.published_at.map(|d| d.unix_timestamp()),
            tag_name: release.tag_name.clone(),
            url: release.url.clone(),
        }
    }
}
impl TryFrom<ReleaseJson> for Release {
    type Error = Error;
    fn try_from(json: ReleaseJson) -> Result<Self, Self::Error> {
        Ok(Self {
            description: json.description,
            description_html: json.description_html,
            is_draft: json.is_draft,
            published_at: json.published_at.map(|d| parse_timestamp(d, "release date")).transpose()?,
            tag_name: json.tag_name,
            url: json.url,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct RepositoryRow {
    pub(crate) id: String,
    pub(crate) package_id: String,
    pub(crate) owner: String,
    pub(crate) name: String,
    pub(crate) owner_name: Option<String>,
    pub(crate) owner_avatar_url: Option<String>,
    pub(crate) is_in_organization: bool,
    pub(crate) default_branch: Option<String>,
    pub(crate) summary: Option<String>,
    pub(crate) homepage_url: Option<String>,
    pub(crate) stars: i64,
    pub(crate) forks: i64,
    pub(crate) license: String,
    pub(crate) license_url: Option<String>,
    pub(crate) open_issues: i64,
    pub(crate) open_pull_requests: i64,
    pub(crate) last_issue_closed_at: Option<i64>,
    pub(crate) last_pull_request_closed_at: Option<i64>,
    pub(crate) funding_links: String,
    pub(crate) keywords: String,
    pub(crate) releases: String,
    pub(crate) readme_html_url: Option<String>,
    pub(crate) s3_readme: Option<String>,
    pub(crate) forked_from: Option<String>,
}
impl TryFrom<&Repository> for RepositoryRow {
    type Error = Error;
    fn try_from(repository: &Repository) -> Result<Self, Self::Error> {
        let releases: Vec<ReleaseJson> = repository.releases.iter().map(ReleaseJson::from).collect();
        Ok(Self {
            id: repository.id.to_string(),
            package_id: repository.package_id.to_string(),
            owner: repository.owner.clone(),
            name: repository.name.clone(),
            owner_name: repository.owner_name.clone(),
            owner_avatar_url: repository.owner_avatar_url.clone(),
            is_in_organization: repository.is_in_organization,
            default_branch: repository.default_branch.clone(),
            summary: repository.summary.clone(),
            homepage_url: repository.homepage_url.clone(),
            stars: i64::from(repository.stars),
            forks: i64::from(repository.forks),
            license: repository.license.key().to_string(),
            license_url: repository.license_url.clone(),
            open_issues: i64::from(repository.open_issues),
            open_pull_requests: i64::from(repository.open_pull_requests),
            last_issue_closed_at: repository.last_issue_closed_at.map(|d| d.unix_timestamp()),
            last_pull_request_closed_at: repository.last_pull_request_closed_at.map(|d| d.unix_timestamp()),
            funding_links: to_json(&repository.funding_links, "funding links")?,
            keywords: to_json(&repository.keywords, "keywords")?,
            releases: to_json(&releases, "releases")?,
            readme_html_url: repository.readme_html_url.clone(),
            s3_readme: repository.s3_readme.as_ref().map(|r| to_json(r, "readme pointer")).transpose()?,
            forked_from: repository.forked_from.as_ref().map(|f| to_json(f, "fork")).transpose()?,
        })
    }
}
impl TryFrom<RepositoryRow> for Repository {
    type Error = Error;
    fn try_from(row: RepositoryRow) -> Result<Self, Self::Error> {
        let count = |value: i64, field: &'static str| u32::try_from(value).or_raise(|| ErrorKind::InvalidData(field));
        let releases: Vec<ReleaseJson> = from_json(&row.releases, "releases")?;
        Ok(Self {
            id: parse_id(&row.id, "repository id")?,
            package_id: parse_id(&row.package_id, "package id")?,
            owner: row.owner,
            name: row.name,
            owner_name: row.owner_name,
            owner_avatar_url: row.owner_avatar_url,
            is_in_organization: row.is_in_organization,
            default_branch: row.default_branch,
            summary: row.summary,
            homepage_url: row.homepage_url,
            stars: count(row.stars, "stars")?,
            forks: count(row.forks, "forks")?,
            license: row.license.parse::<License>().or_raise(|| ErrorKind::InvalidData("license"))?,
            license_url: row.license_url,
            open_issues: count(row.open_issues, "open issues")?,
            open_pull_requests: count(row.open_pull_requests, "open pull requests")?,
            last_issue_closed_at: row
                .last_issue_closed_at
                .map(|d| parse_timestamp(d, "last issue closed date"))
                .transpose()?,
            last_pull_request_closed_at: row
                .last_pull_request_closed_at
                .map(|d| parse_timestamp(d, "last pull request closed date"))
                .transpose()?,
            funding_links: from_json::<Vec<FundingLink>>(&row.funding_links, "funding links")?,
            keywords: from_json::<Vec<String>>(&row.keywords, "keywords")?,
            releases: releases.into_iter().map(Release::try_from).collect::<Result<Vec<_>, Error>>()?,
            readme_html_url: row.readme_html_url,
            s3_readme: row.s3_readme.as_deref().map(|r| from_json::<S3Readme>(r, "readme pointer")).transpose()?,
            forked_from: row.forked_from.as_deref().map(|f| from_json::<Fork>(f, "fork")).transpose()?,
        })
    }
}
