//! Live client for the GitHub REST and GraphQL APIs.

mod graphql;

use crate::error::{ErrorKind, Result};
use crate::readme::private_images;
use crate::{Asset, HostingClient, LicenseInfo, Metadata, Readme};
use async_trait::async_trait;
use exn::{OptionExt, ResultExt};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, ETAG, HeaderMap};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;

const USER_AGENT_VALUE: &str = concat!("pkgindex/", env!("CARGO_PKG_VERSION"));
const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const HTML_MEDIA_TYPE: &str = "application/vnd.github.html+json";

#[derive(Deserialize)]
struct LicenseResponse {
    html_url: Option<String>,
}

#[derive(Deserialize)]
struct ReadmeResponse {
    html_url: Option<String>,
}

/// Map a response status to an error, with `404` optionally meaning "absent".
///
/// Returns `Ok(false)` for an allowed `404`, `Ok(true)` for success.
fn check_status(status: StatusCode, not_found_is_absent: bool) -> Result<bool> {
    match status {
        s if s.is_success() => Ok(true),
        StatusCode::NOT_FOUND if not_found_is_absent => Ok(false),
        StatusCode::NOT_FOUND => exn::bail!(ErrorKind::NotFound),
        s => exn::bail!(ErrorKind::RequestFailed(s.as_u16())),
    }
}

fn etag(headers: &HeaderMap) -> Option<String> {
    headers.get(ETAG).and_then(|v| v.to_str().ok()).map(str::to_string)
}

/// GitHub API client authenticated with a personal access token.
#[derive(Debug, Clone)]
pub struct GithubClient {
    client: Client,
    api_base_url: String,
    token: String,
}

impl GithubClient {
    /// Raises [`ErrorKind::MissingToken`] when no (non-blank) token is given.
    pub fn new(api_base_url: impl Into<String>, token: Option<&str>) -> Result<Self> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_raise(|| ErrorKind::MissingToken)?
            .to_string();
        let client = Client::builder().user_agent(USER_AGENT_VALUE).build().or_raise(|| ErrorKind::Network)?;
        Ok(Self {
            client,
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    fn get(&self, path: &str, accept: &str) -> RequestBuilder {
        self.client
            .get(format!("{}{path}", self.api_base_url))
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(ACCEPT, accept)
    }

    async fn readme_html(&self, owner: &str, repo: &str) -> Result<Option<(Option<String>, String)>> {
        let response = self
            .get(&format!("/repos/{owner}/{repo}/readme"), HTML_MEDIA_TYPE)
            .send()
            .await
            .or_raise(|| ErrorKind::Network)?;
        if !check_status(response.status(), true)? {
            return Ok(None);
        }
        let etag = etag(response.headers());
        let html = response.text().await.or_raise(|| ErrorKind::Network)?;
        Ok(Some((etag, html)))
    }

    async fn readme_url(&self, owner: &str, repo: &str) -> Result<Option<String>> {
        let response = self
            .get(&format!("/repos/{owner}/{repo}/readme"), JSON_MEDIA_TYPE)
            .send()
            .await
            .or_raise(|| ErrorKind::Network)?;
        if !check_status(response.status(), true)? {
            return Ok(None);
        }
        let body: ReadmeResponse = response.json().await.or_raise(|| ErrorKind::Decode)?;
        Ok(body.html_url)
    }
}

#[async_trait]
impl HostingClient for GithubClient {
    #[tracing::instrument(skip(self))]
    async fn fetch_metadata(&self, owner: &str, repo: &str) -> Result<Metadata> {
        let body = serde_json::json!({
            "query": graphql::METADATA_QUERY,
            "variables": { "owner": owner, "name": repo },
        });
        let response = self
            .client
            .post(format!("{}/graphql", self.api_base_url))
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .json(&body)
            .send()
            .await
            .or_raise(|| ErrorKind::Network)?;
        check_status(response.status(), false)?;
        let bytes = response.bytes().await.or_raise(|| ErrorKind::Network)?;
        graphql::parse_metadata(&bytes)
    }

    async fn fetch_license(&self, owner: &str, repo: &str) -> Result<Option<LicenseInfo>> {
        let response = self
            .get(&format!("/repos/{owner}/{repo}/license"), JSON_MEDIA_TYPE)
            .send()
            .await
            .or_raise(|| ErrorKind::Network)?;
        if !check_status(response.status(), true)? {
            tracing::debug!(owner, repo, "Repository has no license");
            return Ok(None);
        }
        let body: LicenseResponse = response.json().await.or_raise(|| ErrorKind::Decode)?;
        Ok(Some(LicenseInfo { html_url: body.html_url }))
    }

    async fn fetch_readme(&self, owner: &str, repo: &str) -> Result<Option<Readme>> {
        let (html, html_url) = futures::try_join!(self.readme_html(owner, repo), self.readme_url(owner, repo))?;
        let Some((etag, html)) = html else {
            tracing::debug!(owner, repo, "Repository has no readme");
            return Ok(None);
        };
        Ok(Some(Readme {
            etag,
            images_to_cache: private_images(&html),
            html,
            html_url,
        }))
    }

    async fn fetch_image(&self, url: &str) -> Result<Asset> {
        // Private image URLs carry their own token; no API authorization.
        let response = self.client.get(url).send().await.or_raise(|| ErrorKind::Network)?;
        check_status(response.status(), false)?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = response.bytes().await.or_raise(|| ErrorKind::Network)?.to_vec();
        Ok(Asset { data, content_type })
    }
}
