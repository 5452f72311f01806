//! The repository metadata GraphQL query and its response shape.

use crate::Metadata;
use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use pkgindex_models::{FundingLink, FundingPlatform, License, Release, Repository};
use serde::Deserialize;
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcDateTime};

pub(crate) const METADATA_QUERY: &str = r#"
query($owner: String!, $name: String!) {
  repository(owner: $owner, name: $name) {
    closedIssues: issues(states: CLOSED, first: 100, orderBy: {field: UPDATED_AT, direction: DESC}) {
      nodes { closedAt }
    }
    closedPullRequests: pullRequests(states: CLOSED, first: 100, orderBy: {field: UPDATED_AT, direction: DESC}) {
      nodes { closedAt }
    }
    defaultBranchRef { name }
    description
    forkCount
    fundingLinks { platform url }
    homepageUrl
    isInOrganization
    licenseInfo { key }
    mergedPullRequests: pullRequests(states: MERGED, first: 100, orderBy: {field: UPDATED_AT, direction: DESC}) {
      nodes { closedAt }
    }
    name
    openIssues: issues(states: OPEN) { totalCount }
    openPullRequests: pullRequests(states: OPEN) { totalCount }
    owner {
      login
      avatarUrl
      ... on User { name }
      ... on Organization { name }
    }
    parent { url }
    releases(first: 20, orderBy: {field: CREATED_AT, direction: DESC}) {
      nodes { description descriptionHTML isDraft publishedAt tagName url }
    }
    repositoryTopics(first: 20) {
      nodes { topic { name } }
    }
    stargazerCount
  }
}
"#;

#[derive(Deserialize)]
struct Response {
    data: Option<Data>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Deserialize)]
struct Data {
    repository: Option<RepositoryNode>,
}

#[derive(Deserialize)]
struct Nodes<T> {
    nodes: Vec<T>,
}

#[derive(Deserialize)]
struct Count {
    #[serde(rename = "totalCount")]
    total_count: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Closed {
    closed_at: Option<String>,
}

#[derive(Deserialize)]
struct Named {
    name: String,
}

#[derive(Deserialize)]
struct Key {
    key: String,
}

#[derive(Deserialize)]
struct Url {
    url: String,
}

#[derive(Deserialize)]
struct Funding {
    platform: String,
    url: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Owner {
    login: String,
    avatar_url: Option<String>,
    name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReleaseNode {
    description: Option<String>,
    #[serde(rename = "descriptionHTML")]
    description_html: Option<String>,
    is_draft: bool,
    published_at: Option<String>,
    tag_name: String,
    url: String,
}

#[derive(Deserialize)]
struct Topic {
    topic: Named,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryNode {
    closed_issues: Nodes<Closed>,
    closed_pull_requests: Nodes<Closed>,
    default_branch_ref: Option<Named>,
    description: Option<String>,
    fork_count: u32,
    #[serde(default)]
    funding_links: Vec<Funding>,
    homepage_url: Option<String>,
    is_in_organization: bool,
    license_info: Option<Key>,
    merged_pull_requests: Nodes<Closed>,
    name: String,
    open_issues: Count,
    open_pull_requests: Count,
    owner: Owner,
    parent: Option<Url>,
    releases: Nodes<ReleaseNode>,
    repository_topics: Nodes<Topic>,
    stargazer_count: u32,
}

fn parse_date(value: &str) -> Result<UtcDateTime> {
    let parsed = OffsetDateTime::parse(value, &Rfc3339).or_raise(|| ErrorKind::Decode)?;
    UtcDateTime::from_unix_timestamp(parsed.unix_timestamp()).or_raise(|| ErrorKind::Decode)
}

fn closed_dates(nodes: &[Closed]) -> Result<Vec<UtcDateTime>> {
    nodes.iter().filter_map(|n| n.closed_at.as_deref()).map(parse_date).collect()
}

fn funding_platform(platform: &str) -> FundingPlatform {
    match platform {
        "COMMUNITY_BRIDGE" => FundingPlatform::CommunityBridge,
        "GITHUB" => FundingPlatform::GitHub,
        "ISSUEHUNT" => FundingPlatform::IssueHunt,
        "KO_FI" => FundingPlatform::KoFi,
        "LFX_CROWDFUNDING" => FundingPlatform::LfxCrowdfunding,
        "LIBERAPAY" => FundingPlatform::Liberapay,
        "OPEN_COLLECTIVE" => FundingPlatform::OpenCollective,
        "OTECHIE" => FundingPlatform::Otechie,
        "PATREON" => FundingPlatform::Patreon,
        "TIDELIFT" => FundingPlatform::Tidelift,
        _ => FundingPlatform::Custom,
    }
}

/// Decode a GraphQL response body into [`Metadata`].
///
/// A `NOT_FOUND` error or a null repository raise [`ErrorKind::NotFound`].
pub(crate) fn parse_metadata(body: &[u8]) -> Result<Metadata> {
    let response: Response = serde_json::from_slice(body).or_raise(|| ErrorKind::Decode)?;
    if let Some(error) = response.errors.first() {
        if error.kind.as_deref() == Some("NOT_FOUND") {
            exn::bail!(ErrorKind::NotFound);
        }
        tracing::warn!(message = %error.message, "GraphQL query returned errors");
    }
    let node = response.data.and_then(|d| d.repository).ok_or_raise(|| ErrorKind::NotFound)?;
    let mut pull_requests_closed_at = closed_dates(&node.closed_pull_requests.nodes)?;
    pull_requests_closed_at.extend(closed_dates(&node.merged_pull_requests.nodes)?);
    let releases = node
        .releases
        .nodes
        .into_iter()
        .map(|r| -> Result<Release> {
            Ok(Release {
                description: r.description,
                description_html: r.description_html,
                is_draft: r.is_draft,
                published_at: r.published_at.as_deref().map(parse_date).transpose()?,
                tag_name: r.tag_name,
                url: r.url,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Metadata {
        owner: node.owner.login,
        name: node.name,
        owner_name: node.owner.name,
        owner_avatar_url: node.owner.avatar_url,
        is_in_organization: node.is_in_organization,
        default_branch: node.default_branch_ref.map(|b| b.name),
        summary: node.description,
        homepage_url: Repository::normalize_homepage(node.homepage_url.as_deref()),
        stars: node.stargazer_count,
        forks: node.fork_count,
        license: License::from_key(node.license_info.as_ref().map(|l| l.key.as_str())),
        open_issues: node.open_issues.total_count,
        open_pull_requests: node.open_pull_requests.total_count,
        issues_closed_at: closed_dates(&node.closed_issues.nodes)?,
        pull_requests_closed_at,
        funding_links: node
            .funding_links
            .into_iter()
            .map(|f| FundingLink {
                platform: funding_platform(&f.platform),
                url: f.url,
            })
            .collect(),
        topics: node.repository_topics.nodes.into_iter().map(|t| t.topic.name).collect(),
        releases,
        parent_url: node.parent.map(|p| p.url),
    })
}
