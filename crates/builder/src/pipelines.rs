//! Builder pipeline queries.

use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use exn::ResultExt;
use pkgindex_config::BuilderConfig;
use reqwest::Client;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use std::fmt::{Display, Formatter, Result as FmtResult};
use tracing::instrument;

/// Page size used by the build farm unless asked otherwise.
pub const DEFAULT_PAGE_SIZE: u32 = 20;
/// Upper bound of pages [`get_status_count`] requests by default.
pub const DEFAULT_MAX_PAGE_COUNT: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineStatus {
    Canceled,
    Created,
    Failed,
    Manual,
    Pending,
    Running,
    Skipped,
    Success,
}
impl PipelineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Canceled => "canceled",
            Self::Created => "created",
            Self::Failed => "failed",
            Self::Manual => "manual",
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Skipped => "skipped",
            Self::Success => "success",
        }
    }
}
impl Display for PipelineStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Pipeline {
    pub id: u64,
    pub status: PipelineStatus,
}

/// Listing of the builder project's pipelines.
#[async_trait]
pub trait PipelineApi: Send + Sync {
    /// One page (1-based) of pipelines with `status`.
    async fn fetch_pipelines(&self, status: PipelineStatus, page: u32, page_size: u32) -> Result<Vec<Pipeline>>;
}

/// Count pipelines with `status`, reading at most `max_page_count` pages.
///
/// Stops at the first page that is not full, so the count is exact below
/// `page_size * max_page_count` and saturates at it otherwise.
#[instrument(skip(api))]
pub async fn get_status_count(
    api: &(dyn PipelineApi + Send + Sync),
    status: PipelineStatus,
    page_size: u32,
    max_page_count: u32,
) -> Result<usize> {
    let mut total = 0;
    let mut page = 1;
    loop {
        let count = api.fetch_pipelines(status, page, page_size).await?.len();
        total += count;
        if count != page_size as usize || page >= max_page_count {
            return Ok(total);
        }
        page += 1;
    }
}

/// Pipelines of the builder project on GitLab.
#[derive(Debug, Clone)]
pub struct GitlabPipelines {
    client: Client,
    project_url: String,
    api_token: String,
}

impl GitlabPipelines {
    /// Raises [`ErrorKind::MissingToken`] when no API token is configured.
    pub fn new(config: &BuilderConfig) -> Result<Self> {
        let api_token = config.api_token().or_raise(|| ErrorKind::MissingToken)?;
        let client = Client::builder().build().or_raise(|| ErrorKind::Network)?;
        Ok(Self {
            client,
            project_url: format!("{}/projects/{}", config.gitlab_api_url.trim_end_matches('/'), config.project_id),
            api_token,
        })
    }

    fn pipelines_url(&self, status: PipelineStatus, page: u32, page_size: u32) -> String {
        format!("{}/pipelines?status={status}&page={page}&per_page={page_size}", self.project_url)
    }
}

#[async_trait]
impl PipelineApi for GitlabPipelines {
    async fn fetch_pipelines(&self, status: PipelineStatus, page: u32, page_size: u32) -> Result<Vec<Pipeline>> {
        let url = self.pipelines_url(status, page, page_size);
        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_token))
            .send()
            .await
            .or_raise(|| ErrorKind::Network)?;
        if !response.status().is_success() {
            exn::bail!(ErrorKind::RequestFailed(response.status().as_u16(), url));
        }
        response.json().await.or_raise(|| ErrorKind::Decode)
    }
}
