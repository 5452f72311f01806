use super::now;
use crate::Database;
use crate::error::{ErrorKind, Result, raise_sqlx};
use crate::models::RepositoryRow;
use exn::ResultExt;
use pkgindex_models::{Id, Repository};
use sqlx::SqlitePool;

/// Hosting metadata of packages, one repository per package.
#[derive(Debug, Clone)]
pub struct RepositoryStore {
    pool: SqlitePool,
}
impl From<&Database> for RepositoryStore {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}
impl RepositoryStore {
    /// Insert the repository of a package, or overwrite every field of the
    /// one already stored for it.
    ///
    /// Raises [`ErrorKind::UniqueViolation`] when another package's
    /// repository already has the same owner and name (ignoring case). The
    /// stored row is left untouched in that case.
    pub async fn upsert(&self, repository: &Repository) -> Result<()> {
        let row = RepositoryRow::try_from(repository)?;
        let now = now();
        raise_sqlx(
            sqlx::query(include_str!("../../queries/upsert_repository.sql"))
                .bind(row.id)
                .bind(row.package_id)
                .bind(row.owner)
                .bind(row.name)
                .bind(row.owner_name)
                .bind(row.owner_avatar_url)
                .bind(row.is_in_organization)
                .bind(row.default_branch)
                .bind(row.summary)
                .bind(row.homepage_url)
                .bind(row.stars)
                .bind(row.forks)
                .bind(row.license)
                .bind(row.license_url)
                .bind(row.open_issues)
                .bind(row.open_pull_requests)
                .bind(row.last_issue_closed_at)
                .bind(row.last_pull_request_closed_at)
                .bind(row.funding_links)
                .bind(row.keywords)
                .bind(row.releases)
                .bind(row.readme_html_url)
                .bind(row.s3_readme)
                .bind(row.forked_from)
                .bind(now)
                .bind(now)
                .execute(&self.pool)
                .await,
        )?;
        Ok(())
    }

    pub async fn find_for_package(&self, package_id: Id) -> Result<Option<Repository>> {
        let row: Option<RepositoryRow> = sqlx::query_as(include_str!("../../queries/get_repository_for_package.sql"))
            .bind(package_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(Repository::try_from).transpose()
    }

    /// All repositories, ordered by owner and name.
    pub async fn list(&self) -> Result<Vec<Repository>> {
        let rows: Vec<RepositoryRow> = sqlx::query_as(include_str!("../../queries/list_repositories.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(Repository::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PackageStore;
    use pkgindex_models::{Fork, License, S3Readme};

    async fn setup() -> (PackageStore, RepositoryStore) {
        let db = Database::connect_in_memory().await.unwrap();
        (PackageStore::from(&db), RepositoryStore::from(&db))
    }

    fn repository(package_id: Id, owner: &str, name: &str) -> Repository {
        let mut repository = Repository::new(package_id);
        repository.owner = owner.to_string();
        repository.name = name.to_string();
        repository
    }

    #[tokio::test]
    async fn test_upsert_inserts_then_overwrites() {
        let (packages, repositories) = setup().await;
        let package = packages.insert("https://github.com/foo/bar").await.unwrap();

        let mut first = repository(package.id, "foo", "bar");
        first.stars = 17;
        first.summary = Some("First summary".to_string());
        first.license = License::Mit;
        first.keywords = vec!["swift".to_string()];
        repositories.upsert(&first).await.unwrap();
        assert_eq!(repositories.find_for_package(package.id).await.unwrap(), Some(first.clone()));

        // A later pass replaces every field, including clearing optional ones.
        let mut second = repository(package.id, "foo", "bar");
        second.stars = 20;
        second.forked_from = Some(Fork::ParentUrl {
            url: "https://github.com/upstream/bar".to_string(),
        });
        second.s3_readme = Some(S3Readme::Cached {
            object_url: "https://readmes.example/foo/bar/readme.html".to_string(),
            etag: "etag".to_string(),
        });
        repositories.upsert(&second).await.unwrap();

        let stored = repositories.find_for_package(package.id).await.unwrap().unwrap();
        assert_eq!(stored.stars, 20);
        assert_eq!(stored.summary, None);
        assert_eq!(stored.license, License::None);
        assert!(stored.keywords.is_empty());
        assert_eq!(stored.forked_from, second.forked_from);
        // The row keeps its original identity.
        assert_eq!(stored.id, first.id);
        assert_eq!(repositories.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_owner_name_collision() {
        let (packages, repositories) = setup().await;
        let winner = packages.insert("https://github.com/foo/bar").await.unwrap();
        let loser = packages.insert("https://github.com/old-foo/bar").await.unwrap();
        let mut existing = repository(winner.id, "foo", "bar");
        existing.stars = 3;
        repositories.upsert(&existing).await.unwrap();

        let err = repositories.upsert(&repository(loser.id, "Foo", "BAR")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::UniqueViolation { details } if details.contains("UNIQUE")));

        let stored = repositories.list().await.unwrap();
        assert_eq!(stored, vec![existing]);
        assert!(repositories.find_for_package(loser.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_repository_is_removed_with_package() {
        let db = Database::connect_in_memory().await.unwrap();
        let packages = PackageStore::from(&db);
        let repositories = RepositoryStore::from(&db);
        let package = packages.insert("https://github.com/foo/bar").await.unwrap();
        repositories.upsert(&repository(package.id, "foo", "bar")).await.unwrap();
        sqlx::query("DELETE FROM packages WHERE id = ?")
            .bind(package.id.to_string())
            .execute(db.pool())
            .await
            .unwrap();
        assert!(repositories.list().await.unwrap().is_empty());
    }
}
