//! Blob store trait for pluggable content storage backends.

use async_trait::async_trait;
use bytes::Bytes;

use crate::result::AppResult;

/// Handle returned by a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StoredBlob {
    /// Opaque key used for later delete/sign calls.
    pub key: String,
    /// Access URL cached on the file record. May be unsigned or expire.
    pub url: String,
}

/// Trait for opaque content storage.
///
/// The filesystem core never looks inside blobs; it only keeps the key on
/// the file record. Implementations live in `cloudio-storage`.
#[async_trait]
pub trait BlobStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "local", "s3").
    fn provider_type(&self) -> &str;

    /// Check whether the provider is healthy and reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Store `data` under a fresh key below `destination_hint`.
    async fn upload(&self, data: Bytes, destination_hint: &str) -> AppResult<StoredBlob>;

    /// Delete the blob stored under `key`. Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Produce a time-limited download URL for `key`.
    async fn sign(&self, key: &str, ttl_seconds: u64) -> AppResult<String>;
}
