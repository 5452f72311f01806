use crate::error::{Error, ErrorKind};
use crate::models::{parse_id, parse_timestamp};
use exn::ResultExt;
use pkgindex_models::{Build, BuildStatus, CompilerVersion, Platform};

#[derive(sqlx::FromRow)]
pub(crate) struct BuildRow {
    pub(crate) id: String,
    pub(crate) version_id: String,
    pub(crate) platform: String,
    pub(crate) compiler_version: String,
    pub(crate) status: String,
    pub(crate) job_url: Option<String>,
    pub(crate) created_at: i64,
    pub(crate) updated_at: i64,
}
impl From<&Build> for BuildRow {
    fn from(build: &Build) -> Self {
        Self {
            id: build.id.to_string(),
            version_id: build.version_id.to_string(),
            platform: build.platform.to_string(),
            compiler_version: build.compiler_version.to_string(),
            status: build.status.to_string(),
            job_url: build.job_url.clone(),
            created_at: build.created_at.unix_timestamp(),
            updated_at: build.updated_at.unix_timestamp(),
        }
    }
}
impl TryFrom<BuildRow> for Build {
    type Error = Error;
    fn try_from(row: BuildRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_id(&row.id, "build id")?,
            version_id: parse_id(&row.version_id, "version id")?,
            platform: row.platform.parse::<Platform>().or_raise(|| ErrorKind::InvalidData("platform"))?,
            compiler_version: row
                .compiler_version
                .parse::<CompilerVersion>()
                .or_raise(|| ErrorKind::InvalidData("compiler version"))?,
            status: row.status.parse::<BuildStatus>().or_raise(|| ErrorKind::InvalidData("build status"))?,
            job_url: row.job_url,
            created_at: parse_timestamp(row.created_at, "build creation date")?,
            updated_at: parse_timestamp(row.updated_at, "build update date")?,
        })
    }
}
