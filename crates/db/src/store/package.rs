use super::now;
use crate::Database;
use crate::error::{ErrorKind, Result, raise_sqlx};
use crate::models::PackageRow;
use exn::ResultExt;
use pkgindex_models::{Id, Package, Stage, Status, normalize_url};
use sqlx::SqlitePool;
use std::time::Duration;

/// Stage/status tracking for packages.
///
/// Packages are never locked: running at most one batch per stage at a time
/// is up to the caller.
#[derive(Debug, Clone)]
pub struct PackageStore {
    pool: SqlitePool,
}
impl From<&Database> for PackageStore {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}
impl PackageStore {
    // =========================================================================
    // Insert
    // =========================================================================

    /// Start tracking a package URL.
    ///
    /// Raises [`ErrorKind::UniqueViolation`] when a URL differing only in case
    /// or `.git` suffix is already tracked.
    pub async fn insert(&self, url: impl Into<String>) -> Result<Package> {
        let package = Package::new(url);
        self.insert_package(&package).await?;
        Ok(package)
    }

    /// Persist a fully specified package, e.g. one restored from elsewhere.
    pub async fn insert_package(&self, package: &Package) -> Result<()> {
        let row = PackageRow::from(package);
        raise_sqlx(
            sqlx::query(include_str!("../../queries/insert_package.sql"))
                .bind(row.id)
                .bind(row.url)
                .bind(package.normalized_url())
                .bind(row.status)
                .bind(row.processing_stage)
                .bind(row.created_at)
                .bind(row.updated_at)
                .execute(&self.pool)
                .await,
        )?;
        Ok(())
    }

    // =========================================================================
    // Get/Fetch
    // =========================================================================

    pub async fn find(&self, id: Id) -> Result<Option<Package>> {
        let row: Option<PackageRow> = sqlx::query_as(include_str!("../../queries/get_package.sql"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(Package::try_from).transpose()
    }

    /// Id of the package tracked under `url`, compared after normalization.
    pub async fn find_id_by_url(&self, url: &str) -> Result<Option<Id>> {
        let row: Option<(String,)> = sqlx::query_as(include_str!("../../queries/get_package_id_by_normalized_url.sql"))
            .bind(normalize_url(url))
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(|(id,)| crate::models::parse_id(&id, "package id")).transpose()
    }

    /// All packages, ordered by URL.
    pub async fn list(&self) -> Result<Vec<Package>> {
        let rows: Vec<PackageRow> = sqlx::query_as(include_str!("../../queries/list_packages.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(Package::try_from).collect()
    }

    /// Packages currently in `stage`, least recently updated first.
    pub async fn select_batch(&self, stage: Stage, limit: usize) -> Result<Vec<Package>> {
        let limit = i64::try_from(limit).or_raise(|| ErrorKind::InvalidData("limit"))?;
        let rows: Vec<PackageRow> = sqlx::query_as(include_str!("../../queries/select_batch.sql"))
            .bind(stage.as_str())
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(Package::try_from).collect()
    }

    /// Packages due for processing in `stage`, least recently updated first.
    ///
    /// That is packages that completed the preceding stage, plus packages
    /// that already reached `stage` (or went beyond it) but have not been
    /// updated within `deadtime`.
    pub async fn fetch_candidates(&self, stage: Stage, limit: usize, deadtime: Duration) -> Result<Vec<Package>> {
        let limit = i64::try_from(limit).or_raise(|| ErrorKind::InvalidData("limit"))?;
        let deadtime = i64::try_from(deadtime.as_secs()).or_raise(|| ErrorKind::InvalidData("dead time"))?;
        let preceding = stage.previous().unwrap_or(stage);
        let revisited: Vec<&str> = [Stage::Reconciliation, Stage::Ingestion, Stage::Analysis]
            .into_iter()
            .filter(|s| *s >= stage)
            .map(|s| s.as_str())
            .collect();
        let revisited = serde_json::to_string(&revisited).or_raise(|| ErrorKind::InvalidData("stages"))?;
        let rows: Vec<PackageRow> = sqlx::query_as(include_str!("../../queries/fetch_candidates.sql"))
            .bind(preceding.as_str())
            .bind(revisited)
            .bind(now().saturating_sub(deadtime))
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(Package::try_from).collect()
    }

    // =========================================================================
    // Update
    // =========================================================================

    /// Atomically move a package to `stage` with `status`.
    pub async fn advance(&self, id: Id, stage: Stage, status: Status) -> Result<()> {
        let result = sqlx::query(include_str!("../../queries/advance_package.sql"))
            .bind(stage.as_str())
            .bind(status.as_str())
            .bind(now())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        if result.rows_affected() == 0 {
            exn::bail!(ErrorKind::NotFound(format!("package {id}")));
        }
        tracing::debug!(package_id = %id, stage = %stage, status = %status, "Advanced package");
        Ok(())
    }
}
