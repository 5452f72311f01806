use crate::error::{ErrorKind, Result};
use exn::OptionExt;
use serde::{Deserialize, Serialize};

/// Settings for the external build farm (a GitLab pipeline project).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Public API base URL that build jobs report results back to.
    pub api_base_url: String,
    pub gitlab_api_url: String,
    pub project_id: u64,
    /// Branch of the builder project to run pipelines on.
    pub branch: String,
    /// Token authorising pipeline triggers.
    pub pipeline_token: Option<String>,
    /// Token authorising pipeline queries.
    pub api_token: Option<String>,
    /// Bearer token build jobs present when reporting results.
    pub builder_token: Option<String>,
    /// Bucket receiving documentation archives from doc builds.
    pub docs_bucket: Option<String>,
    pub build_timeout_minutes: u32,
}
impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080/api".to_string(),
            gitlab_api_url: "https://gitlab.com/api/v4".to_string(),
            project_id: 19564054,
            branch: "main".to_string(),
            pipeline_token: None,
            api_token: None,
            builder_token: None,
            docs_bucket: None,
            build_timeout_minutes: 10,
        }
    }
}

/// Everything a build trigger needs, validated to be present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerCredentials {
    pub pipeline_token: String,
    pub builder_token: String,
    pub docs_bucket: String,
}

impl BuilderConfig {
    /// Validate the values required to trigger a build.
    ///
    /// Raises [`ErrorKind::MissingConfiguration`] naming the first absent
    /// value; blank values count as absent.
    pub fn trigger_credentials(&self) -> Result<TriggerCredentials> {
        Ok(TriggerCredentials {
            pipeline_token: required(&self.pipeline_token, "builder.pipeline_token")?,
            builder_token: required(&self.builder_token, "builder.builder_token")?,
            docs_bucket: required(&self.docs_bucket, "builder.docs_bucket")?,
        })
    }

    /// Validate the token required to query pipelines.
    pub fn api_token(&self) -> Result<String> {
        required(&self.api_token, "builder.api_token")
    }
}

fn required(value: &Option<String>, name: &'static str) -> Result<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_raise(|| ErrorKind::MissingConfiguration(name))
}
