//! Build farm pipeline triggers.
//!
//! Each build (one platform and compiler version for one package version) is
//! run as a pipeline of the builder project, parameterised entirely through
//! pipeline variables.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use pkgindex_config::{BuilderConfig, TriggerCredentials};
use pkgindex_config::error::ErrorKind as ConfigErrorKind;
use pkgindex_models::{CompilerVersion, Id, Platform, Reference};
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::instrument;

/// Extra minutes documentation builds are allowed on top of the build timeout.
const DOC_BUILD_EXTRA_MINUTES: u32 = 5;

/// One build to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildJob<'a> {
    pub build_id: Id,
    pub clone_url: &'a str,
    pub is_doc_build: bool,
    pub platform: Platform,
    pub reference: &'a Reference,
    pub compiler_version: CompilerVersion,
    pub version_id: Id,
}

/// A fully resolved pipeline trigger, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerRequest {
    pub url: String,
    pub token: String,
    pub git_ref: String,
    pub variables: BTreeMap<&'static str, String>,
}
impl TriggerRequest {
    /// Query parameters, variables encoded as `variables[KEY]=value`.
    pub fn query(&self) -> Vec<(String, String)> {
        let mut query = vec![("token".to_string(), self.token.clone()), ("ref".to_string(), self.git_ref.clone())];
        query.extend(self.variables.iter().map(|(key, value)| (format!("variables[{key}]"), value.clone())));
        query
    }
}

/// Acknowledgement of a pipeline trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerResponse {
    pub status: u16,
    /// Web URL of the pipeline, if the acknowledgement could be read.
    pub web_url: Option<String>,
}

#[derive(Deserialize)]
struct PipelineCreated {
    web_url: String,
}

/// Build the trigger for `job`.
///
/// Raises [`ErrorKind::MissingConfiguration`] when the pipeline token, the
/// builder token or the docs bucket is not configured.
pub fn trigger_request(config: &BuilderConfig, job: &BuildJob<'_>) -> Result<TriggerRequest> {
    let credentials = credentials(config)?;
    let timeout = config.build_timeout_minutes + if job.is_doc_build { DOC_BUILD_EXTRA_MINUTES } else { 0 };
    let variables = BTreeMap::from([
        ("API_BASEURL", config.api_base_url.clone()),
        ("AWS_DOCS_BUCKET", credentials.docs_bucket),
        ("BUILD_ID", job.build_id.to_string()),
        ("BUILD_PLATFORM", job.platform.as_str().to_string()),
        ("BUILDER_TOKEN", credentials.builder_token),
        ("CLONE_URL", job.clone_url.to_string()),
        ("REFERENCE", job.reference.to_string()),
        ("SWIFT_VERSION", job.compiler_version.major_minor()),
        ("TIMEOUT", format!("{timeout}m")),
        ("VERSION_ID", job.version_id.to_string()),
    ]);
    Ok(TriggerRequest {
        url: format!(
            "{}/projects/{}/trigger/pipeline",
            config.gitlab_api_url.trim_end_matches('/'),
            config.project_id
        ),
        token: credentials.pipeline_token,
        git_ref: config.branch.clone(),
        variables,
    })
}

fn credentials(config: &BuilderConfig) -> Result<TriggerCredentials> {
    config.trigger_credentials().map_err(|err| {
        let name = match &*err {
            ConfigErrorKind::MissingConfiguration(name) => *name,
            ConfigErrorKind::Load => "builder",
        };
        err.raise(ErrorKind::MissingConfiguration(name))
    })
}

/// Read the pipeline web URL from a trigger acknowledgement.
pub fn parse_trigger_response(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<PipelineCreated>(body).ok().map(|created| created.web_url)
}

/// Client triggering builds on the build farm.
#[derive(Debug, Clone)]
pub struct BuildTrigger {
    client: Client,
    config: BuilderConfig,
}

impl BuildTrigger {
    pub fn new(config: BuilderConfig) -> Result<Self> {
        let client = Client::builder().build().or_raise(|| ErrorKind::Network)?;
        Ok(Self { client, config })
    }

    /// Check that builds can be triggered at all.
    pub fn validate(&self) -> Result<()> {
        credentials(&self.config).map(|_| ())
    }

    /// Submit `job` to the build farm.
    ///
    /// Configuration is validated before anything is sent. Once submitted,
    /// an acknowledgement that cannot be read is not an error (the pipeline
    /// may well have been created): the raw body is logged and the response
    /// carries no web URL.
    #[instrument(skip_all, fields(build_id = %job.build_id, platform = %job.platform))]
    pub async fn trigger_build(&self, job: &BuildJob<'_>) -> Result<TriggerResponse> {
        let request = trigger_request(&self.config, job)?;
        let response = self
            .client
            .post(&request.url)
            .query(&request.query())
            .send()
            .await
            .or_raise(|| ErrorKind::Network)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.or_raise(|| ErrorKind::Network)?;
        let web_url = parse_trigger_response(&body);
        match &web_url {
            Some(web_url) => tracing::info!(%web_url, "Triggered build"),
            None => tracing::error!(
                clone_url = job.clone_url,
                reference = %job.reference,
                compiler_version = %job.compiler_version,
                version_id = %job.version_id,
                status,
                body = %String::from_utf8_lossy(&body),
                "Trigger failed"
            ),
        }
        Ok(TriggerResponse { status, web_url })
    }
}
