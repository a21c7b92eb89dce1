//! S3-compatible blob store (requires the `s3` feature).

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::{debug, info};

use cloudio_core::config::S3StorageConfig;
use cloudio_core::error::{AppError, ErrorKind};
use cloudio_core::result::AppResult;
use cloudio_core::traits::{BlobStore, StoredBlob};

use super::local::new_key;

/// Blob store backed by an S3 bucket.
#[derive(Debug, Clone)]
pub struct S3BlobStore {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl S3BlobStore {
    /// Create a store for the configured bucket. Credentials come from the
    /// standard AWS provider chain.
    pub async fn new(config: &S3StorageConfig) -> AppResult<Self> {
        if config.bucket.is_empty() {
            return Err(AppError::configuration("storage.s3.bucket must be set"));
        }
        info!(
            endpoint = %config.endpoint,
            region = %config.region,
            bucket = %config.bucket,
            "Initializing S3 blob store"
        );

        let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()))
            .load()
            .await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if !config.endpoint.is_empty() {
            builder = builder.endpoint_url(&config.endpoint).force_path_style(true);
        }

        Ok(Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn object_url(&self, key: &str) -> String {
        if self.public_base_url.is_empty() {
            format!("s3://{}/{key}", self.bucket)
        } else {
            format!("{}/{key}", self.public_base_url)
        }
    }
}

fn s3_error(context: String, e: impl std::error::Error + Send + Sync + 'static) -> AppError {
    AppError::with_source(ErrorKind::DependencyFailure, context, e)
}

#[async_trait]
impl BlobStore for S3BlobStore {
    fn provider_type(&self) -> &str {
        "s3"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(self
            .client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .is_ok())
    }

    async fn upload(&self, data: Bytes, destination_hint: &str) -> AppResult<StoredBlob> {
        let key = new_key(destination_hint);
        let size = data.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| s3_error(format!("Failed to upload blob: {key}"), e))?;

        debug!(key = %key, bytes = size, "Stored blob in S3");
        Ok(StoredBlob {
            url: self.object_url(&key),
            key,
        })
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        // S3 reports success for keys that do not exist.
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| s3_error(format!("Failed to delete blob: {key}"), e))?;
        Ok(())
    }

    async fn sign(&self, key: &str, ttl_seconds: u64) -> AppResult<String> {
        let presigning = PresigningConfig::expires_in(Duration::from_secs(ttl_seconds))
            .map_err(|e| s3_error("Invalid presigning TTL".to_string(), e))?;
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| s3_error(format!("Failed to presign blob: {key}"), e))?;
        Ok(request.uri().to_string())
    }
}
