use crate::error::{ErrorKind, PackageFailure, Result};
use crate::fork::resolve_fork;
use crate::readme::{FetchedReadme, ReadmeCache};
use exn::{OptionExt, ResultExt};
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use pkgindex_config::{Config, IngestionConfig};
use pkgindex_db::error::ErrorKind as DbErrorKind;
use pkgindex_db::{Database, PackageStore, RepositoryStore};
use pkgindex_hosting::{GithubClient, HostingHandle, LicenseInfo, Metadata};
use pkgindex_models::{Fork, Id, Package, Repository, S3Readme, Stage, Status};
use pkgindex_storage::StoreHandle;
use pkgindex_storage::backend::S3Store;
use std::sync::Arc;
use tracing::instrument;

/// Which packages an ingestion run processes.
#[derive(Debug, Clone)]
pub enum Selector {
    /// Up to `n` candidates: packages fresh out of reconciliation, plus
    /// packages due for re-ingestion, oldest first.
    Limit(usize),
    /// One package, whatever its stage.
    Id(Id),
    /// Exactly these packages.
    Explicit(Vec<Package>),
}

/// Per-package outcomes of an ingestion run.
#[derive(Debug, Default)]
pub struct IngestionReport {
    pub succeeded: Vec<Id>,
    pub failed: Vec<PackageFailure>,
}

/// Fetches hosting metadata for packages and records it as their
/// [`Repository`].
pub struct Ingestion {
    packages: PackageStore,
    repositories: RepositoryStore,
    hosting: HostingHandle,
    readmes: ReadmeCache,
    config: IngestionConfig,
}

impl Ingestion {
    pub fn new(db: &Database, hosting: HostingHandle, store: StoreHandle, config: IngestionConfig) -> Self {
        Self {
            packages: PackageStore::from(db),
            repositories: RepositoryStore::from(db),
            readmes: ReadmeCache::new(hosting.clone(), store),
            hosting,
            config,
        }
    }

    /// Ingestion against the live hosting service and readme bucket.
    ///
    /// Raises [`ErrorKind::Configuration`] when the hosting token or any of
    /// the readme bucket settings are missing.
    pub fn from_config(db: &Database, config: &Config) -> Result<Self> {
        let hosting = GithubClient::new(&config.hosting.api_base_url, config.hosting.token.as_deref())
            .or_raise(|| ErrorKind::Configuration)?;
        let storage = &config.storage;
        let bucket = storage.readme_bucket.clone().ok_or_raise(|| ErrorKind::Configuration)?;
        let key_id = storage.key_id.clone().ok_or_raise(|| ErrorKind::Configuration)?;
        let key_secret = storage.key_secret.clone().ok_or_raise(|| ErrorKind::Configuration)?;
        let store = S3Store::new("readmes", bucket, &storage.region, storage.endpoint.clone(), key_id, key_secret);
        Ok(Self::new(db, Arc::new(hosting), Arc::new(store), config.ingestion.clone()))
    }

    /// Ingest the selected packages.
    ///
    /// Packages are processed concurrently, up to `max_concurrency` at a
    /// time. A failing package never aborts the run: it is marked
    /// [`Status::IngestionFailed`] and reported in
    /// [`IngestionReport::failed`]. Every package ends the run in
    /// [`Stage::Ingestion`], and all of its writes have completed by the time
    /// this returns.
    ///
    /// Only failing to select the packages in the first place is an error.
    #[instrument(skip(self, selector))]
    pub async fn ingest(&self, selector: Selector) -> Result<IngestionReport> {
        let packages = self.select(selector).await?;
        tracing::info!(count = packages.len(), "Ingesting packages");

        let mut futures: Vec<_> = packages.iter().map(|package| self.process(package)).collect();
        let mut processing = FuturesUnordered::new();
        processing.extend(futures.drain(..self.config.max_concurrency.max(1).min(futures.len())));
        let mut report = IngestionReport::default();
        while let Some(outcome) = processing.next().await {
            match outcome {
                Ok(id) => report.succeeded.push(id),
                Err(failure) => report.failed.push(failure),
            }
            // Pop-n-push, FIFO.
            if !futures.is_empty() {
                processing.push(futures.remove(0));
            }
        }

        tracing::info!(succeeded = report.succeeded.len(), failed = report.failed.len(), "Ingestion complete");
        Ok(report)
    }

    /// Ingest the next batch of candidates, `limit` packages at most.
    pub async fn ingest_due(&self) -> Result<IngestionReport> {
        self.ingest(Selector::Limit(self.config.limit)).await
    }

    async fn select(&self, selector: Selector) -> Result<Vec<Package>> {
        match selector {
            Selector::Limit(limit) => self
                .packages
                .fetch_candidates(Stage::Ingestion, limit, self.config.reingestion_deadtime())
                .await
                .or_raise(|| ErrorKind::Database),
            Selector::Id(id) => {
                let package = self.packages.find(id).await.or_raise(|| ErrorKind::Database)?;
                if package.is_none() {
                    tracing::warn!(package_id = %id, "No package to ingest");
                }
                Ok(package.into_iter().collect())
            },
            Selector::Explicit(packages) => Ok(packages),
        }
    }

    async fn process(&self, package: &Package) -> std::result::Result<Id, PackageFailure> {
        let outcome = self.ingest_package(package).await.map_err(|error| PackageFailure {
            package_id: package.id,
            error,
        });
        self.update_package(package, outcome).await
    }

    async fn ingest_package(&self, package: &Package) -> Result<()> {
        let (owner, repo) = package.owner_repository().or_raise(|| ErrorKind::InvalidUrl(package.url.clone()))?;
        let previous = self.repositories.find_for_package(package.id).await.or_raise(|| ErrorKind::Database)?;
        let previous_readme = previous.as_ref().and_then(|r| r.s3_readme.as_ref());

        let (metadata, license, readme) = futures::join!(
            self.hosting.fetch_metadata(&owner, &repo),
            self.hosting.fetch_license(&owner, &repo),
            self.readmes.fetch_if_changed(&owner, &repo, previous_readme),
        );
        let metadata = match metadata {
            Ok(metadata) => metadata,
            Err(err) => {
                let details = (*err).to_string();
                return Err(err.raise(ErrorKind::FetchMetadataFailed {
                    owner,
                    name: repo,
                    details,
                }));
            },
        };
        let license = license.unwrap_or_else(|err| {
            tracing::warn!(%owner, %repo, error = ?err, "Failed to fetch license");
            None
        });
        let readme = readme.unwrap_or_else(|err| {
            tracing::warn!(%owner, %repo, error = ?err, "Failed to fetch readme");
            None
        });

        let forked_from = resolve_fork(&self.packages, metadata.parent_url.as_deref()).await;
        let s3_readme = match &readme {
            Some(FetchedReadme { readme, changed: true }) => Some(self.readmes.cache(&owner, &repo, readme).await),
            _ => previous_readme.cloned(),
        };

        let mut repository = build_repository(package.id, metadata, license, readme, s3_readme, forked_from);
        if let Some(previous) = &previous {
            repository.id = previous.id;
        }
        self.update_repository(&repository).await
    }

    async fn update_repository(&self, repository: &Repository) -> Result<()> {
        let Err(err) = self.repositories.upsert(repository).await else {
            return Ok(());
        };
        let (owner, name) = (repository.owner.clone(), repository.name.clone());
        let kind = match &*err {
            DbErrorKind::UniqueViolation { details } => ErrorKind::RepositorySaveUniqueViolation {
                owner,
                name,
                details: details.clone(),
            },
            other => ErrorKind::RepositorySaveFailed {
                owner,
                name,
                details: other.to_string(),
            },
        };
        Err(err.raise(kind))
    }

    /// Record the outcome of ingesting `package`.
    ///
    /// The package always moves to [`Stage::Ingestion`]. Failing to record
    /// the outcome is logged and otherwise ignored.
    pub async fn update_package(
        &self,
        package: &Package,
        outcome: std::result::Result<(), PackageFailure>,
    ) -> std::result::Result<Id, PackageFailure> {
        let status = match &outcome {
            Ok(()) => package.status.after_successful_ingestion(),
            Err(failure) => {
                match failure.kind() {
                    ErrorKind::RepositorySaveUniqueViolation { .. } => {
                        tracing::error!(package_id = %package.id, "{failure}");
                    },
                    _ => tracing::warn!(package_id = %package.id, url = %package.url, "{failure}"),
                }
                Status::IngestionFailed
            },
        };
        if let Err(err) = self.packages.advance(package.id, Stage::Ingestion, status).await {
            tracing::error!(package_id = %package.id, error = ?err, "Failed to record ingestion outcome");
        }
        outcome.map(|()| package.id)
    }
}

/// A fully overwritten repository record from freshly fetched values.
fn build_repository(
    package_id: Id,
    metadata: Metadata,
    license: Option<LicenseInfo>,
    readme: Option<FetchedReadme>,
    s3_readme: Option<S3Readme>,
    forked_from: Option<Fork>,
) -> Repository {
    let last_issue_closed_at = metadata.last_issue_closed_at();
    let last_pull_request_closed_at = metadata.last_pull_request_closed_at();
    Repository {
        owner: metadata.owner,
        name: metadata.name,
        owner_name: metadata.owner_name,
        owner_avatar_url: metadata.owner_avatar_url,
        is_in_organization: metadata.is_in_organization,
        default_branch: metadata.default_branch,
        summary: metadata.summary,
        homepage_url: Repository::normalize_homepage(metadata.homepage_url.as_deref()),
        stars: metadata.stars,
        forks: metadata.forks,
        license: metadata.license,
        license_url: license.and_then(|l| l.html_url),
        open_issues: metadata.open_issues,
        open_pull_requests: metadata.open_pull_requests,
        last_issue_closed_at,
        last_pull_request_closed_at,
        funding_links: metadata.funding_links,
        keywords: Repository::normalize_keywords(&metadata.topics),
        releases: metadata.releases,
        readme_html_url: readme.and_then(|r| r.readme.html_url),
        s3_readme,
        forked_from,
        ..Repository::new(package_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkgindex_hosting::error::ErrorKind as HostingErrorKind;
    use pkgindex_hosting::{ImageToCache, MockHosting, Readme};
    use pkgindex_models::License;
    use pkgindex_storage::backend::MockStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Harness {
        db: Database,
        ingestion: Ingestion,
        hosting: Arc<MockHosting>,
        store: Arc<MockStore>,
    }
    impl Harness {
        async fn new(hosting: MockHosting) -> Self {
            Self::with_config(hosting, IngestionConfig::default()).await
        }

        async fn with_config(hosting: MockHosting, config: IngestionConfig) -> Self {
            let db = Database::connect_in_memory().await.unwrap();
            let hosting = Arc::new(hosting);
            let store = Arc::new(MockStore::default());
            let ingestion = Ingestion::new(&db, hosting.clone(), store.clone(), config);
            Self {
                db,
                ingestion,
                hosting,
                store,
            }
        }

        fn packages(&self) -> PackageStore {
            PackageStore::from(&self.db)
        }

        fn repositories(&self) -> RepositoryStore {
            RepositoryStore::from(&self.db)
        }

        async fn save(&self, urls: &[&str]) -> Vec<Package> {
            let mut saved = Vec::new();
            for url in urls {
                saved.push(self.packages().insert(*url).await.unwrap());
            }
            saved
        }

        async fn repository(&self, package: &Package) -> Repository {
            self.repositories().find_for_package(package.id).await.unwrap().unwrap()
        }
    }

    fn readme(etag: &str, images: &[&str]) -> Readme {
        Readme {
            etag: Some(etag.to_string()),
            html: "<p>readme</p>".to_string(),
            html_url: Some("https://github.com/foo/bar/blob/main/README.md".to_string()),
            images_to_cache: images
                .iter()
                .map(|name| ImageToCache {
                    original_url: format!("https://private-user-images.githubusercontent.com/1/{name}?jwt=t"),
                    file_name: name.to_string(),
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_ingest() {
        let hosting = MockHosting::default()
            .with_metadata(|owner, repo| {
                let mut metadata = Metadata::new(owner, repo);
                metadata.summary = Some(format!("This is package {owner}/{repo}"));
                metadata.license = License::Mit;
                metadata.topics = vec!["Swift".to_string(), "server".to_string(), "swift".to_string()];
                metadata.issues_closed_at = [3, 1, 2].map(|t| time::UtcDateTime::from_unix_timestamp(t).unwrap()).to_vec();
                Ok(metadata)
            })
            .with_license(|owner, repo| {
                Ok(Some(LicenseInfo {
                    html_url: Some(format!("https://github.com/{owner}/{repo}/blob/main/LICENSE")),
                }))
            });
        let harness = Harness::new(hosting).await;
        let packages = harness.save(&["https://github.com/foo/1", "https://github.com/foo/2"]).await;

        let report = harness.ingestion.ingest(Selector::Limit(10)).await.unwrap();

        assert_eq!(report.succeeded.len(), 2);
        assert!(report.failed.is_empty());
        let repository = harness.repository(&packages[0]).await;
        assert_eq!((repository.owner.as_str(), repository.name.as_str()), ("foo", "1"));
        assert_eq!(repository.summary.as_deref(), Some("This is package foo/1"));
        assert_eq!(repository.license, License::Mit);
        assert_eq!(repository.license_url.as_deref(), Some("https://github.com/foo/1/blob/main/LICENSE"));
        assert_eq!(repository.keywords, ["server", "swift"]);
        assert_eq!(repository.last_issue_closed_at.map(|t| t.unix_timestamp()), Some(3));
        assert_eq!(repository.last_pull_request_closed_at, None);
        assert_eq!(repository.s3_readme, None);
        for package in harness.packages().list().await.unwrap() {
            assert_eq!(package.status, Status::New);
            assert_eq!(package.stage, Stage::Ingestion);
        }
    }

    #[tokio::test]
    async fn test_ingest_continues_on_error() {
        let harness = Harness::new(MockHosting::default()).await;
        let packages = harness.save(&["https://github.com/foo/1", "https://github.com/foo/2"]).await;
        let invalid = Package::new("https://example.com/not/a/repository/url");
        harness.packages().insert_package(&invalid).await.unwrap();

        let report = harness
            .ingestion
            .ingest(Selector::Explicit(vec![invalid.clone(), packages[0].clone(), packages[1].clone()]))
            .await
            .unwrap();

        assert_eq!(report.succeeded.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].package_id, invalid.id);
        assert!(matches!(report.failed[0].kind(), ErrorKind::InvalidUrl(_)));
        assert_eq!(harness.repositories().list().await.unwrap().len(), 2);
        let invalid = harness.packages().find(invalid.id).await.unwrap().unwrap();
        assert_eq!(invalid.status, Status::IngestionFailed);
        assert_eq!(invalid.stage, Stage::Ingestion);
    }

    #[tokio::test]
    async fn test_ingest_bad_metadata() {
        let hosting = MockHosting::default()
            .with_metadata(|owner, repo| match (owner, repo) {
                ("foo", "2") => Err(exn::Exn::from(HostingErrorKind::RequestFailed(400))),
                _ => {
                    let mut metadata = Metadata::new(owner, repo);
                    metadata.summary = Some(format!("This is package {owner}/{repo}"));
                    Ok(metadata)
                },
            })
            .with_readme(|_, _| Ok(Some(readme("etag1", &["private-1.png"]))));
        let harness = Harness::new(hosting).await;
        harness
            .save(&["https://github.com/foo/1", "https://github.com/foo/2", "https://github.com/foo/3"])
            .await;

        let report = harness.ingestion.ingest(Selector::Limit(10)).await.unwrap();

        let mut summaries: Vec<String> =
            harness.repositories().list().await.unwrap().into_iter().filter_map(|r| r.summary).collect();
        summaries.sort();
        assert_eq!(summaries, ["This is package foo/1", "This is package foo/3"]);
        // Every readme is fetched, but only the ingested packages' are cached.
        assert_eq!(harness.hosting.readme_calls(), 3);
        assert_eq!(harness.store.store_calls(), 2);
        assert_eq!(harness.store.store_many_calls(), 2);
        assert_eq!(harness.hosting.image_calls(), 2);
        let keys: Vec<String> = harness.store.keys().await.iter().map(ToString::to_string).collect();
        assert!(keys.iter().all(|key| !key.starts_with("foo/2/")), "{keys:?}");
        assert_eq!(report.failed.len(), 1);
        assert!(matches!(
            report.failed[0].kind(),
            ErrorKind::FetchMetadataFailed { owner, name, details }
                if owner == "foo" && name == "2" && details.contains("400")
        ));
        for package in harness.packages().list().await.unwrap() {
            let expected = match package.url.as_str() {
                "https://github.com/foo/2" => Status::IngestionFailed,
                _ => Status::New,
            };
            assert_eq!(package.status, expected, "{}", package.url);
            assert_eq!(package.stage, Stage::Ingestion);
        }
    }

    #[tokio::test]
    async fn test_ingest_unique_owner_name_violation() {
        // Both packages resolve to the same repository, as after a rename.
        let hosting = MockHosting::default().with_metadata(|_, _| {
            let mut metadata = Metadata::new("owner", "name");
            metadata.summary = Some("desc".to_string());
            Ok(metadata)
        });
        let harness = Harness::new(hosting).await;
        for url in ["https://github.com/foo/0", "https://github.com/foo/1"] {
            let package = Package::new(url).with_status(Status::Ok);
            harness.packages().insert_package(&package).await.unwrap();
        }

        let report = harness.ingestion.ingest(Selector::Limit(10)).await.unwrap();

        assert_eq!(harness.repositories().list().await.unwrap().len(), 1);
        assert_eq!(report.succeeded.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert!(matches!(
            report.failed[0].kind(),
            ErrorKind::RepositorySaveUniqueViolation { owner, name, .. } if owner == "owner" && name == "name"
        ));
        let packages = harness.packages().list().await.unwrap();
        let statuses: Vec<Status> = packages.iter().map(|p| p.status).collect();
        assert!(statuses.contains(&Status::Ok));
        assert!(statuses.contains(&Status::IngestionFailed));
        assert!(packages.iter().all(|p| p.stage == Stage::Ingestion));
        let failed = packages.iter().find(|p| p.status == Status::IngestionFailed).unwrap();
        assert_eq!(failed.id, report.failed[0].package_id);
        // The surviving repository belongs to the package that succeeded.
        let winner = packages.iter().find(|p| p.status == Status::Ok).unwrap();
        assert_eq!(harness.repository(winner).await.summary.as_deref(), Some("desc"));
    }

    #[tokio::test]
    async fn test_readme_only_stored_on_etag_change() {
        let calls = AtomicUsize::new(0);
        let hosting = MockHosting::default().with_readme(move |_, _| {
            let etag = ["etag1", "etag1", "etag2"][calls.fetch_add(1, Ordering::SeqCst).min(2)];
            Ok(Some(readme(etag, &["private-1.png"])))
        });
        let harness = Harness::new(hosting).await;
        let package = harness.save(&["https://github.com/foo/bar"]).await.remove(0);

        let mut store_calls = Vec::new();
        let mut image_calls = Vec::new();
        for _ in 0..3 {
            harness.ingestion.ingest(Selector::Id(package.id)).await.unwrap();
            store_calls.push(harness.store.store_calls());
            image_calls.push(harness.hosting.image_calls());
        }

        assert_eq!(harness.hosting.readme_calls(), 3);
        assert_eq!(store_calls, [1, 1, 2]);
        // An unchanged etag doesn't download the private images again either.
        assert_eq!(image_calls, [1, 1, 2]);
        assert_eq!(harness.store.store_many_calls(), 2);
        assert_eq!(
            harness.repository(&package).await.s3_readme,
            Some(S3Readme::Cached {
                object_url: "mock://mock/foo/bar/readme.html".to_string(),
                etag: "etag2".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_readme_private_images_stored_in_one_batch() {
        let hosting =
            MockHosting::default().with_readme(|_, _| Ok(Some(readme("etag1", &["private-1.png", "private-2.png"]))));
        let harness = Harness::new(hosting).await;
        let package = harness.save(&["https://github.com/Foo/Bar"]).await.remove(0);

        harness.ingestion.ingest(Selector::Id(package.id)).await.unwrap();

        assert_eq!(harness.hosting.image_calls(), 2);
        assert_eq!(harness.store.store_many_calls(), 1);
        let keys: Vec<String> = harness.store.keys().await.iter().map(ToString::to_string).collect();
        assert_eq!(keys, ["foo/bar/private-1.png", "foo/bar/private-2.png", "foo/bar/readme.html"]);
        let repository = harness.repository(&package).await;
        assert_eq!(
            repository.readme_html_url.as_deref(),
            Some("https://github.com/foo/bar/blob/main/README.md")
        );
    }

    #[tokio::test]
    async fn test_readme_store_error_does_not_fail_ingestion() {
        let hosting = MockHosting::default().with_readme(|_, _| Ok(Some(readme("etag1", &[]))));
        let harness = Harness::new(hosting).await;
        harness.store.set_failing(true);
        let package = harness.save(&["https://github.com/foo/bar"]).await.remove(0);

        let report = harness.ingestion.ingest(Selector::Id(package.id)).await.unwrap();

        assert_eq!(report.succeeded, [package.id]);
        assert!(harness.repository(&package).await.s3_readme.is_some_and(|r| r.is_error()));

        // The error pointer never matches an etag, so the next pass retries.
        harness.store.set_failing(false);
        harness.ingestion.ingest(Selector::Id(package.id)).await.unwrap();
        assert!(matches!(harness.repository(&package).await.s3_readme, Some(S3Readme::Cached { .. })));
    }

    #[tokio::test]
    async fn test_missing_readme_keeps_previous_pointer() {
        let calls = AtomicUsize::new(0);
        let hosting = MockHosting::default().with_readme(move |_, _| match calls.fetch_add(1, Ordering::SeqCst) {
            0 => Ok(Some(readme("etag1", &[]))),
            _ => Ok(None),
        });
        let harness = Harness::new(hosting).await;
        let package = harness.save(&["https://github.com/foo/bar"]).await.remove(0);

        harness.ingestion.ingest(Selector::Id(package.id)).await.unwrap();
        let cached = harness.repository(&package).await.s3_readme;
        harness.ingestion.ingest(Selector::Id(package.id)).await.unwrap();

        assert!(cached.is_some());
        assert_eq!(harness.repository(&package).await.s3_readme, cached);
        assert_eq!(harness.store.store_calls(), 1);
    }

    #[tokio::test]
    async fn test_fork_resolution() {
        let hosting = MockHosting::default().with_metadata(|owner, repo| {
            let mut metadata = Metadata::new(owner, repo);
            metadata.parent_url = match repo {
                "tracked-fork" => Some("https://github.com/Foo/Parent".to_string()),
                "untracked-fork" => Some("https://github.com/bar/elsewhere.git".to_string()),
                _ => None,
            };
            Ok(metadata)
        });
        let harness = Harness::new(hosting).await;
        let packages = harness
            .save(&[
                "https://github.com/foo/parent.git",
                "https://github.com/foo/tracked-fork",
                "https://github.com/foo/untracked-fork",
            ])
            .await;

        harness.ingestion.ingest(Selector::Limit(10)).await.unwrap();

        assert_eq!(harness.repository(&packages[0]).await.forked_from, None);
        assert_eq!(
            harness.repository(&packages[1]).await.forked_from,
            Some(Fork::ParentId {
                id: packages[0].id,
                fallback_url: "https://github.com/Foo/Parent".to_string(),
            })
        );
        assert_eq!(
            harness.repository(&packages[2]).await.forked_from,
            Some(Fork::ParentUrl {
                url: "https://github.com/bar/elsewhere.git".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_blank_homepage_is_dropped() {
        let hosting = MockHosting::default().with_metadata(|owner, repo| {
            let mut metadata = Metadata::new(owner, repo);
            metadata.homepage_url = Some("  ".to_string());
            Ok(metadata)
        });
        let harness = Harness::new(hosting).await;
        let package = harness.save(&["https://github.com/foo/bar"]).await.remove(0);

        harness.ingestion.ingest(Selector::Id(package.id)).await.unwrap();

        assert_eq!(harness.repository(&package).await.homepage_url, None);
    }

    #[tokio::test]
    async fn test_all_writes_flushed_before_return() {
        let config = IngestionConfig {
            max_concurrency: 3,
            ..IngestionConfig::default()
        };
        let harness = Harness::with_config(MockHosting::default(), config).await;
        let urls: Vec<String> = (0..20).map(|i| format!("https://github.com/foo/{i}")).collect();
        let urls: Vec<&str> = urls.iter().map(String::as_str).collect();
        let packages = harness.save(&urls).await;

        let report = harness.ingestion.ingest(Selector::Limit(urls.len())).await.unwrap();

        assert_eq!(report.succeeded.len(), urls.len());
        let mut ingested: Vec<Id> = harness.repositories().list().await.unwrap().iter().map(|r| r.package_id).collect();
        let mut expected: Vec<Id> = packages.iter().map(|p| p.id).collect();
        ingested.sort();
        expected.sort();
        assert_eq!(ingested, expected);
    }

    #[tokio::test]
    async fn test_ingest_due_respects_configured_limit() {
        let config = IngestionConfig {
            limit: 2,
            ..IngestionConfig::default()
        };
        let harness = Harness::with_config(MockHosting::default(), config).await;
        harness
            .save(&["https://github.com/foo/1", "https://github.com/foo/2", "https://github.com/foo/3"])
            .await;

        let first = harness.ingestion.ingest_due().await.unwrap();
        let second = harness.ingestion.ingest_due().await.unwrap();

        assert_eq!(first.succeeded.len(), 2);
        assert_eq!(second.succeeded.len(), 1);
        assert_eq!(harness.repositories().list().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_ingest_unknown_id_is_empty() {
        let harness = Harness::new(MockHosting::default()).await;
        let report = harness.ingestion.ingest(Selector::Id(Id::new_v4())).await.unwrap();
        assert!(report.succeeded.is_empty() && report.failed.is_empty());
    }

    #[tokio::test]
    async fn test_update_package() {
        let harness = Harness::new(MockHosting::default()).await;
        let packages = harness.save(&["https://github.com/foo/1", "https://github.com/foo/2"]).await;
        let failure = PackageFailure {
            package_id: packages[0].id,
            error: exn::Exn::from(ErrorKind::FetchMetadataFailed {
                owner: String::new(),
                name: String::new(),
                details: String::new(),
            }),
        };

        assert!(harness.ingestion.update_package(&packages[0], Err(failure)).await.is_err());
        assert_eq!(harness.ingestion.update_package(&packages[1], Ok(())).await.unwrap(), packages[1].id);

        let stored = harness.packages().list().await.unwrap();
        assert_eq!(stored.iter().map(|p| p.status).collect::<Vec<_>>(), [Status::IngestionFailed, Status::New]);
        assert!(stored.iter().all(|p| p.stage == Stage::Ingestion));
    }

    #[tokio::test]
    async fn test_update_package_keeps_settled_success() {
        let harness = Harness::new(MockHosting::default()).await;
        let ok = Package::new("https://github.com/foo/1").with_status(Status::Ok);
        let new = Package::new("https://github.com/foo/2");
        for package in [&ok, &new] {
            harness.packages().insert_package(package).await.unwrap();
            harness.ingestion.update_package(package, Ok(())).await.unwrap();
        }

        let stored = harness.packages().list().await.unwrap();
        assert_eq!(stored.iter().map(|p| p.status).collect::<Vec<_>>(), [Status::Ok, Status::New]);
        assert!(stored.iter().all(|p| p.stage == Stage::Ingestion));
    }

    #[tokio::test]
    async fn test_from_config_requires_configuration() {
        let db = Database::connect_in_memory().await.unwrap();
        let mut config = Config::default();
        let err = Ingestion::from_config(&db, &config).err().unwrap();
        assert!(matches!(&*err, ErrorKind::Configuration));

        config.hosting.token = Some("token".to_string());
        let err = Ingestion::from_config(&db, &config).err().unwrap();
        assert!(matches!(&*err, ErrorKind::Configuration));

        config.storage.readme_bucket = Some("readmes".to_string());
        config.storage.key_id = Some("key".to_string());
        config.storage.key_secret = Some("secret".to_string());
        assert!(Ingestion::from_config(&db, &config).is_ok());
    }
}
