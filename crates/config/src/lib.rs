//! Configuration for the package index pipeline.
//!
//! All configuration is resolved once at process start into a [`Config`] and
//! injected into the components that need it. Sources are layered, later
//! sources overriding earlier ones:
//!
//! 1. Built-in defaults.
//! 2. A TOML file (explicit path, or `config.toml` in the platform's
//!    configuration directory).
//! 3. Environment variables prefixed with `PKGINDEX_`, nested with `__`
//!    (e.g. `PKGINDEX_BUILDER__PIPELINE_TOKEN`).
//!
//! Values only some operations need are optional here, and validated into
//! non-optional views by the operation that needs them (see
//! [`BuilderConfig::trigger_credentials`]).

mod builder;
pub mod error;

pub use crate::builder::{BuilderConfig, TriggerCredentials};
use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_PREFIX: &str = "PKGINDEX_";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub hosting: HostingConfig,
    pub storage: StorageConfig,
    pub builder: BuilderConfig,
    pub ingestion: IngestionConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub max_connections: Option<u32>,
}
impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("pkgindex.sqlite3"),
            max_connections: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostingConfig {
    pub api_base_url: String,
    pub token: Option<String>,
}
impl Default for HostingConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.github.com".to_string(),
            token: None,
        }
    }
}

/// Object store holding cached readme assets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub readme_bucket: Option<String>,
    pub region: String,
    pub endpoint: Option<String>,
    pub key_id: Option<String>,
    pub key_secret: Option<String>,
}
impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            readme_bucket: None,
            region: "us-east-2".to_string(),
            endpoint: None,
            key_id: None,
            key_secret: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// Packages per scheduled ingestion run (`Ingestion::ingest_due`).
    pub limit: usize,
    /// Packages already past ingestion are re-ingested after this long.
    pub reingestion_deadtime_minutes: u64,
    /// Upper bound of packages processed concurrently within a run.
    pub max_concurrency: usize,
}
impl IngestionConfig {
    pub fn reingestion_deadtime(&self) -> Duration {
        Duration::from_secs(self.reingestion_deadtime_minutes * 60)
    }
}
impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            limit: 100,
            reingestion_deadtime_minutes: 90,
            max_concurrency: 100,
        }
    }
}

impl Config {
    /// Load configuration from the layered sources.
    ///
    /// A missing configuration file is not an error; a malformed one is.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = path.map(Path::to_path_buf).or_else(Self::default_path);
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(file) = file {
            tracing::debug!(path = %file.display(), "Reading configuration file");
            figment = figment.merge(Toml::file(file));
        }
        Self::extract(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    fn extract(figment: Figment) -> Result<Self> {
        figment.extract().or_raise(|| ErrorKind::Load)
    }

    /// `config.toml` in the platform configuration directory, if the
    /// platform has one.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "pkgindex").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.builder.branch, "main");
        assert_eq!(config.builder.build_timeout_minutes, 10);
        assert_eq!(config.ingestion.limit, 100);
        assert_eq!(config.ingestion.reingestion_deadtime(), Duration::from_secs(90 * 60));
        assert_eq!(config.builder.pipeline_token, None);
    }

    #[test]
    fn test_file_then_environment_layering() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "pkgindex.toml",
                r#"
                    [builder]
                    docs_bucket = "docs-from-file"
                    build_timeout_minutes = 20

                    [storage]
                    readme_bucket = "readmes"
                "#,
            )?;
            jail.set_env("PKGINDEX_BUILDER__DOCS_BUCKET", "docs-from-env");
            jail.set_env("PKGINDEX_INGESTION__LIMIT", "5");
            let config = Config::load(Some(Path::new("pkgindex.toml"))).unwrap();
            assert_eq!(config.builder.docs_bucket.as_deref(), Some("docs-from-env"));
            assert_eq!(config.builder.build_timeout_minutes, 20);
            assert_eq!(config.storage.readme_bucket.as_deref(), Some("readmes"));
            assert_eq!(config.ingestion.limit, 5);
            Ok(())
        });
    }

    #[test]
    fn test_malformed_file_is_a_load_error() {
        Jail::expect_with(|jail| {
            jail.create_file("broken.toml", "[ingestion]\nlimit = \"many\"")?;
            let err = Config::load(Some(Path::new("broken.toml"))).unwrap_err();
            assert!(matches!(&*err, ErrorKind::Load));
            Ok(())
        });
    }
}
