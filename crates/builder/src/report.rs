//! Build records around the build farm round trip.
//!
//! A build is recorded as `triggered` before its pipeline is submitted, gets
//! the pipeline's web URL attached once the build farm acknowledges it, and
//! is completed by the job reporting its outcome back.

use crate::error::{Error, ErrorKind, Result};
use crate::trigger::{BuildJob, BuildTrigger};
use pkgindex_db::error::ErrorKind as DbErrorKind;
use pkgindex_db::{BuildStore, Database};
use pkgindex_models::{Build, BuildStatus, CompilerVersion, Id, Platform, Version};

/// What to build for a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildRequest {
    pub platform: Platform,
    pub compiler_version: CompilerVersion,
    pub is_doc_build: bool,
}

pub struct BuildReports {
    builds: BuildStore,
}
impl From<&Database> for BuildReports {
    fn from(db: &Database) -> Self {
        Self {
            builds: BuildStore::from(db),
        }
    }
}

impl BuildReports {
    /// Record a new build of `version` and submit it to the build farm.
    ///
    /// Nothing is recorded when the trigger configuration is incomplete. Once
    /// recorded, the build stays `triggered` even if submission fails, so it
    /// shows as queued until it is retried or times out.
    pub async fn trigger(
        &self,
        trigger: &BuildTrigger,
        version: &Version,
        clone_url: &str,
        request: BuildRequest,
    ) -> Result<Build> {
        trigger.validate()?;
        let mut build = self
            .builds
            .create_triggered(version.id, request.platform, request.compiler_version)
            .await
            .map_err(raise_db)?;
        let job = BuildJob {
            build_id: build.id,
            clone_url,
            is_doc_build: request.is_doc_build,
            platform: request.platform,
            reference: &version.reference,
            compiler_version: request.compiler_version,
            version_id: version.id,
        };
        let response = trigger.trigger_build(&job).await?;
        if let Some(web_url) = response.web_url {
            self.builds.set_job_url(build.id, &web_url).await.map_err(raise_db)?;
            build.job_url = Some(web_url);
        }
        Ok(build)
    }

    /// Record the outcome a build job reported.
    ///
    /// Raises [`ErrorKind::NotFound`] for an unknown build, and
    /// [`ErrorKind::InvalidTransition`] when the build already completed or
    /// `status` is `triggered`.
    pub async fn record_report(&self, build_id: Id, status: BuildStatus) -> Result<Build> {
        let build = self.builds.record_report(build_id, status).await.map_err(raise_db)?;
        tracing::info!(build_id = %build.id, status = %build.status, "Recorded build report");
        Ok(build)
    }
}

fn raise_db(err: pkgindex_db::error::Error) -> Error {
    let kind = match &*err {
        DbErrorKind::NotFound(_) => ErrorKind::NotFound,
        DbErrorKind::InvalidTransition(_) => ErrorKind::InvalidTransition,
        _ => ErrorKind::Database,
    };
    err.raise(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkgindex_config::BuilderConfig;
    use pkgindex_db::PackageStore;
    use pkgindex_models::{Reference, VersionKind};
    use rstest::rstest;

    async fn setup() -> (Database, Version) {
        let db = Database::connect_in_memory().await.unwrap();
        let package = PackageStore::from(&db).insert("https://github.com/foo/bar").await.unwrap();
        let version = Version::new(package.id, Reference::Tag("1.0.0".to_string()), VersionKind::Release);
        BuildStore::from(&db).insert_version(&version).await.unwrap();
        (db, version)
    }

    #[rstest]
    #[case::ok(BuildStatus::Ok)]
    #[case::failed(BuildStatus::Failed)]
    #[case::timeout(BuildStatus::Timeout)]
    #[case::infrastructure_error(BuildStatus::InfrastructureError)]
    #[tokio::test]
    async fn test_record_report(#[case] status: BuildStatus) {
        let (db, version) = setup().await;
        let build = BuildStore::from(&db).create_triggered(version.id, Platform::Linux, CompilerVersion::V6_0).await.unwrap();
        let reports = BuildReports::from(&db);

        let reported = reports.record_report(build.id, status).await.unwrap();
        assert_eq!(reported.status, status);

        // Terminal builds are immutable.
        let err = reports.record_report(build.id, BuildStatus::Ok).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidTransition));
    }

    #[tokio::test]
    async fn test_record_report_unknown_build() {
        let (db, _) = setup().await;
        let err = BuildReports::from(&db).record_report(Id::new_v4(), BuildStatus::Ok).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound));
    }

    #[tokio::test]
    async fn test_trigger_without_configuration_records_nothing() {
        let (db, version) = setup().await;
        let trigger = BuildTrigger::new(BuilderConfig::default()).unwrap();
        let request = BuildRequest {
            platform: Platform::Ios,
            compiler_version: CompilerVersion::V6_1,
            is_doc_build: false,
        };

        let err = BuildReports::from(&db)
            .trigger(&trigger, &version, "https://github.com/foo/bar.git", request)
            .await
            .unwrap_err();

        assert!(matches!(&*err, ErrorKind::MissingConfiguration("builder.pipeline_token")));
        assert!(BuildStore::from(&db).builds_for_version(version.id).await.unwrap().is_empty());
    }
}
