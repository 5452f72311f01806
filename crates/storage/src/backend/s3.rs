//! S3-compatible object store.
//!
//! Credentials are provided explicitly via the configuration file
//! (`storage.key_id` / `storage.key_secret`).

use crate::backend::{Object, ObjectStore};
use crate::error::{ErrorKind, Result};
use crate::Key;
use async_trait::async_trait;
use aws_sdk_s3::{
    Client,
    config::{BehaviorVersion, Credentials, Region, retry::RetryConfig},
    error::{DisplayErrorContext, SdkError},
    primitives::ByteStream,
};
use exn::ResultExt;
use futures::stream::{FuturesUnordered, TryStreamExt};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Generous default for concurrent S3 requests.
const DEFAULT_CONCURRENT_REQUESTS: usize = 100;

/// S3-compatible object store bound to one bucket.
///
/// Objects are served straight from the bucket, so the URL returned by
/// [`store`](ObjectStore::store) is the object's public bucket URL.
#[derive(Debug, Clone)]
pub struct S3Store {
    name: String,
    client: Client,
    bucket: String,
    base_url: String,
    /// Rate limiter for concurrent S3 requests.
    rate_limiter: Arc<Semaphore>,
}

impl S3Store {
    /// Create a new S3 object store.
    ///
    /// # Arguments
    /// * `name` - A name for this store (used in logging)
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region or provider-specific region
    /// * `endpoint` - Custom endpoint URL for S3-compatible services
    /// * `key_id` - AWS/provider access key ID
    /// * `key_secret` - AWS/provider secret access key
    pub fn new(
        name: impl Into<String>,
        bucket: impl Into<String>,
        region: impl Into<String>,
        endpoint: Option<String>,
        key_id: impl Into<String>,
        key_secret: impl Into<String>,
    ) -> Self {
        let bucket = bucket.into();
        let region = region.into();
        let credentials = Credentials::new(key_id, key_secret, None, None, "pkgindex-config");
        let mut config_builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new(region.clone()))
            // Exponential backoff, 1 initial attempt + 3 retries
            .retry_config(RetryConfig::standard().with_max_attempts(4))
            // Path-style addressing for S3-compatible services (MinIO, etc.)
            .force_path_style(true);
        if let Some(endpoint_url) = &endpoint {
            config_builder = config_builder.endpoint_url(endpoint_url);
        }
        Self {
            name: name.into(),
            client: Client::from_conf(config_builder.build()),
            base_url: Self::base_url(&bucket, &region, endpoint.as_deref()),
            bucket,
            rate_limiter: Arc::new(Semaphore::new(DEFAULT_CONCURRENT_REQUESTS)),
        }
    }

    fn base_url(bucket: &str, region: &str, endpoint: Option<&str>) -> String {
        match endpoint {
            Some(endpoint) => format!("{}/{bucket}", endpoint.trim_end_matches('/')),
            None => format!("https://{bucket}.s3.{region}.amazonaws.com"),
        }
    }

    fn url_for(&self, key: &Key) -> String {
        format!("{}/{key}", self.base_url)
    }

    fn classify<E, R>(err: &SdkError<E, R>) -> ErrorKind
    where
        E: std::error::Error + 'static,
        R: std::fmt::Debug,
    {
        let message = DisplayErrorContext(err).to_string();
        match err {
            SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => ErrorKind::Network(message),
            _ => ErrorKind::BackendError(message),
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    fn name(&self) -> &str {
        &self.name
    }

    async fn store(&self, key: &Key, data: Vec<u8>, content_type: &str) -> Result<String> {
        let _permit = self
            .rate_limiter
            .acquire()
            .await
            .or_raise(|| ErrorKind::BackendError("rate limiter closed".to_string()))?;
        tracing::debug!(store = %self.name, key = %key, bytes = data.len(), "Storing object");
        let result = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await;
        match result {
            Ok(_) => Ok(self.url_for(key)),
            Err(e) => {
                let kind = Self::classify(&e);
                Err(e).or_raise(|| kind)
            },
        }
    }

    async fn store_many(&self, objects: Vec<Object>) -> Result<()> {
        let uploads: FuturesUnordered<_> = objects
            .into_iter()
            .map(|object| async move { self.store(&object.key, object.data, &object.content_type).await })
            .collect();
        uploads.try_collect::<Vec<_>>().await?;
        Ok(())
    }
}
