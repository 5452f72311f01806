use super::now;
use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::{BuildRow, VersionRow};
use exn::ResultExt;
use pkgindex_models::{Build, BuildStatus, CompilerVersion, Id, Platform, Version, VersionKind};
use sqlx::SqlitePool;

/// Versions of packages and the builds run against them.
#[derive(Debug, Clone)]
pub struct BuildStore {
    pool: SqlitePool,
}
impl From<&Database> for BuildStore {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}
impl BuildStore {
    // =========================================================================
    // Insert
    // =========================================================================

    pub async fn insert_version(&self, version: &Version) -> Result<()> {
        let row = VersionRow::try_from(version)?;
        sqlx::query(include_str!("../../queries/insert_version.sql"))
            .bind(row.id)
            .bind(row.package_id)
            .bind(row.reference)
            .bind(row.kind)
            .bind(row.doc_archives)
            .bind(row.created_at)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    /// Record a build that is about to be submitted to the build farm.
    pub async fn create_triggered(
        &self,
        version_id: Id,
        platform: Platform,
        compiler_version: CompilerVersion,
    ) -> Result<Build> {
        let build = Build::triggered(version_id, platform, compiler_version);
        self.insert_build(&build).await?;
        Ok(build)
    }

    pub async fn insert_build(&self, build: &Build) -> Result<()> {
        let row = BuildRow::from(build);
        sqlx::query(include_str!("../../queries/insert_build.sql"))
            .bind(row.id)
            .bind(row.version_id)
            .bind(row.platform)
            .bind(row.compiler_version)
            .bind(row.status)
            .bind(row.job_url)
            .bind(row.created_at)
            .bind(row.updated_at)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    // =========================================================================
    // Get/Fetch
    // =========================================================================

    pub async fn find_build(&self, id: Id) -> Result<Option<Build>> {
        let row: Option<BuildRow> = sqlx::query_as(include_str!("../../queries/get_build.sql"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(Build::try_from).transpose()
    }

    /// Builds of a version, newest first.
    pub async fn builds_for_version(&self, version_id: Id) -> Result<Vec<Build>> {
        let rows: Vec<BuildRow> = sqlx::query_as(include_str!("../../queries/list_builds_for_version.sql"))
            .bind(version_id.to_string())
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(Build::try_from).collect()
    }

    /// The most recent version of each kind a package has, in
    /// [`VersionKind::ALL`] order, each with its builds (newest first).
    ///
    /// Kinds the package has no version of are skipped.
    pub async fn latest_versions_with_builds(&self, package_id: Id) -> Result<Vec<(Version, Vec<Build>)>> {
        let mut result = Vec::with_capacity(VersionKind::ALL.len());
        for kind in VersionKind::ALL {
            let row: Option<VersionRow> = sqlx::query_as(include_str!("../../queries/latest_version_for_kind.sql"))
                .bind(package_id.to_string())
                .bind(kind.as_str())
                .fetch_optional(&self.pool)
                .await
                .or_raise(|| ErrorKind::Database)?;
            if let Some(row) = row {
                let version = Version::try_from(row)?;
                let builds = self.builds_for_version(version.id).await?;
                result.push((version, builds));
            }
        }
        Ok(result)
    }

    // =========================================================================
    // Update
    // =========================================================================

    /// Attach the build farm's job URL to a build.
    pub async fn set_job_url(&self, id: Id, job_url: &str) -> Result<()> {
        let result = sqlx::query(include_str!("../../queries/set_build_job_url.sql"))
            .bind(job_url)
            .bind(now())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        if result.rows_affected() == 0 {
            exn::bail!(ErrorKind::NotFound(format!("build {id}")));
        }
        Ok(())
    }

    /// Record the terminal outcome a build job reported.
    ///
    /// Only a `triggered` build accepts a report, and only with a terminal
    /// status; anything else raises [`ErrorKind::InvalidTransition`] and
    /// leaves the build unchanged.
    pub async fn record_report(&self, id: Id, status: BuildStatus) -> Result<Build> {
        if !BuildStatus::Triggered.can_transition_to(status) {
            exn::bail!(ErrorKind::InvalidTransition(format!("build {id} cannot be reported as {status}")));
        }
        let result = sqlx::query(include_str!("../../queries/report_build.sql"))
            .bind(status.as_str())
            .bind(now())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let build = self.find_build(id).await?;
        match build {
            None => exn::bail!(ErrorKind::NotFound(format!("build {id}"))),
            Some(build) if result.rows_affected() == 0 => exn::bail!(ErrorKind::InvalidTransition(format!(
                "build {id} is already {}, cannot be reported as {status}",
                build.status
            ))),
            Some(build) => Ok(build),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PackageStore;
    use pkgindex_models::Reference;
    use rstest::rstest;
    use time::UtcDateTime;

    async fn setup() -> (BuildStore, Id) {
        let db = Database::connect_in_memory().await.unwrap();
        let package = PackageStore::from(&db).insert("https://github.com/foo/bar").await.unwrap();
        (BuildStore::from(&db), package.id)
    }

    fn version_at(package_id: Id, reference: Reference, kind: VersionKind, timestamp: i64) -> Version {
        let mut version = Version::new(package_id, reference, kind);
        version.created_at = UtcDateTime::from_unix_timestamp(timestamp).unwrap();
        version
    }

    #[tokio::test]
    async fn test_create_and_report() {
        let (store, package_id) = setup().await;
        let version = Version::new(package_id, Reference::Tag("1.0.0".to_string()), VersionKind::Release);
        store.insert_version(&version).await.unwrap();
        let build = store.create_triggered(version.id, Platform::Ios, CompilerVersion::V5_8).await.unwrap();
        store.set_job_url(build.id, "https://gitlab.com/jobs/1").await.unwrap();

        let reported = store.record_report(build.id, BuildStatus::Ok).await.unwrap();
        assert_eq!(reported.status, BuildStatus::Ok);
        assert_eq!(reported.job_url.as_deref(), Some("https://gitlab.com/jobs/1"));
    }

    #[rstest]
    #[case::already_terminal(BuildStatus::Failed)]
    #[case::back_to_triggered(BuildStatus::Triggered)]
    #[tokio::test]
    async fn test_report_is_one_way(#[case] next: BuildStatus) {
        let (store, package_id) = setup().await;
        let version = Version::new(package_id, Reference::Branch("main".to_string()), VersionKind::DefaultBranch);
        store.insert_version(&version).await.unwrap();
        let build = store.create_triggered(version.id, Platform::Linux, CompilerVersion::V6_0).await.unwrap();
        store.record_report(build.id, BuildStatus::Timeout).await.unwrap();

        let err = store.record_report(build.id, next).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidTransition(_)));
        let stored = store.find_build(build.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BuildStatus::Timeout);
    }

    #[tokio::test]
    async fn test_report_unknown_build() {
        let (store, _) = setup().await;
        let err = store.record_report(Id::new_v4(), BuildStatus::Ok).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_same_second_builds_newest_first() {
        let (store, package_id) = setup().await;
        let version = Version::new(package_id, Reference::Tag("1.0.0".to_string()), VersionKind::Release);
        store.insert_version(&version).await.unwrap();
        let mut ids = Vec::new();
        for _ in 0..10 {
            let mut build = Build::triggered(version.id, Platform::Ios, CompilerVersion::V6_0);
            build.created_at = UtcDateTime::from_unix_timestamp(1_000).unwrap();
            store.insert_build(&build).await.unwrap();
            ids.push(build.id);
        }
        ids.reverse();

        let listed: Vec<Id> = store.builds_for_version(version.id).await.unwrap().iter().map(|b| b.id).collect();
        assert_eq!(listed, ids);
    }

    #[tokio::test]
    async fn test_same_second_versions_latest_inserted_wins() {
        let (store, package_id) = setup().await;
        let mut last = None;
        for tag in ["1.0.0", "1.0.1", "1.0.2", "1.0.3", "1.0.4"] {
            let version = version_at(package_id, Reference::Tag(tag.to_string()), VersionKind::Release, 1_000);
            store.insert_version(&version).await.unwrap();
            last = Some(version.id);
        }

        let latest = store.latest_versions_with_builds(package_id).await.unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(Some(latest[0].0.id), last);
    }

    #[tokio::test]
    async fn test_latest_versions_with_builds() {
        let (store, package_id) = setup().await;
        let old = version_at(package_id, Reference::Tag("1.0.0".to_string()), VersionKind::Release, 1_000);
        let new = version_at(package_id, Reference::Tag("1.1.0".to_string()), VersionKind::Release, 2_000);
        let main = version_at(package_id, Reference::Branch("main".to_string()), VersionKind::DefaultBranch, 1_500);
        for version in [&old, &new, &main] {
            store.insert_version(version).await.unwrap();
        }
        let mut first = Build::triggered(new.id, Platform::Ios, CompilerVersion::V5_8);
        first.created_at = UtcDateTime::from_unix_timestamp(3_000).unwrap();
        let mut second = Build::triggered(new.id, Platform::Ios, CompilerVersion::V5_8);
        second.created_at = UtcDateTime::from_unix_timestamp(4_000).unwrap();
        store.insert_build(&first).await.unwrap();
        store.insert_build(&second).await.unwrap();

        let latest = store.latest_versions_with_builds(package_id).await.unwrap();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].0.id, new.id);
        let build_ids: Vec<_> = latest[0].1.iter().map(|b| b.id).collect();
        assert_eq!(build_ids, [second.id, first.id]);
        assert_eq!(latest[1].0.kind, VersionKind::DefaultBranch);
        assert!(latest[1].1.is_empty());
    }
}
