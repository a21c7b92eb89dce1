//! Local filesystem blob store.

use std::path::{Component, Path, PathBuf};
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use tokio::fs;
use tokio_util::io::ReaderStream;
use tracing::debug;
use uuid::Uuid;

use cloudio_core::error::{AppError, ErrorKind};
use cloudio_core::result::AppResult;
use cloudio_core::traits::{BlobStore, StoredBlob};

use crate::signing::UrlSigner;

/// A stream of blob bytes.
pub type BlobStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send>>;

/// Route under which the API serves local blobs.
const BLOB_ROUTE: &str = "/api/blobs";

/// Blob store writing to a directory on the local filesystem.
///
/// Blobs are served back by the API's blob route, which checks the
/// signature produced by [`BlobStore::sign`].
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    /// Root directory for all stored blobs.
    root: PathBuf,
    /// Externally reachable base URL of the API server.
    public_url: String,
    signer: UrlSigner,
}

impl LocalBlobStore {
    /// Create a store rooted at `root_path`, creating the directory if needed.
    pub async fn new(root_path: &str, public_url: &str, signing_secret: &str) -> AppResult<Self> {
        let signer = UrlSigner::new(signing_secret)?;
        let root = PathBuf::from(root_path);
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::DependencyFailure,
                format!("Failed to create blob root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self {
            root,
            public_url: public_url.trim_end_matches('/').to_string(),
            signer,
        })
    }

    /// The unsigned URL of `key`, cached on file records.
    pub fn public_url_for(&self, key: &str) -> String {
        format!("{}{BLOB_ROUTE}/{key}", self.public_url)
    }

    /// Check a download signature presented to the blob route.
    pub fn verify(&self, key: &str, expires: i64, signature: &str) -> AppResult<()> {
        self.signer
            .verify(key, expires, signature, chrono::Utc::now().timestamp())
    }

    /// Open the blob stored under `key` for streaming.
    pub async fn open(&self, key: &str) -> AppResult<BlobStream> {
        let full_path = self.resolve(key)?;
        let file = fs::File::open(&full_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("Blob not found: {key}"))
            } else {
                AppError::with_source(
                    ErrorKind::DependencyFailure,
                    format!("Failed to open blob: {key}"),
                    e,
                )
            }
        })?;
        Ok(Box::pin(ReaderStream::new(file)))
    }

    /// Resolve a key to a path inside the root, refusing anything that
    /// could escape it.
    fn resolve(&self, key: &str) -> AppResult<PathBuf> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(AppError::not_found(format!("Blob not found: {key}")));
        }
        Ok(self.root.join(relative))
    }

    /// Ensure the parent directory of a path exists.
    async fn ensure_parent(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::DependencyFailure,
                    format!("Failed to create directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }
}

/// Build a fresh key below `destination_hint`.
pub(crate) fn new_key(destination_hint: &str) -> String {
    let hint = destination_hint
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
        .collect::<Vec<_>>()
        .join("/");
    let id = Uuid::new_v4().simple();
    if hint.is_empty() {
        id.to_string()
    } else {
        format!("{hint}/{id}")
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    fn provider_type(&self) -> &str {
        "local"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(fs::metadata(&self.root)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false))
    }

    async fn upload(&self, data: Bytes, destination_hint: &str) -> AppResult<StoredBlob> {
        let key = new_key(destination_hint);
        let full_path = self.resolve(&key)?;
        self.ensure_parent(&full_path).await?;

        fs::write(&full_path, &data).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::DependencyFailure,
                format!("Failed to write blob: {key}"),
                e,
            )
        })?;

        debug!(key = %key, bytes = data.len(), "Stored blob");
        Ok(StoredBlob {
            url: self.public_url_for(&key),
            key,
        })
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let full_path = self.resolve(key)?;
        match fs::remove_file(&full_path).await {
            Ok(()) => {
                debug!(key, "Deleted blob");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::with_source(
                ErrorKind::DependencyFailure,
                format!("Failed to delete blob: {key}"),
                e,
            )),
        }
    }

    async fn sign(&self, key: &str, ttl_seconds: u64) -> AppResult<String> {
        self.resolve(key)?;
        let ttl = i64::try_from(ttl_seconds).unwrap_or(i64::MAX);
        let expires = chrono::Utc::now().timestamp().saturating_add(ttl);
        let signature = self.signer.signature(key, expires);
        Ok(format!(
            "{}?expires={expires}&signature={signature}",
            self.public_url_for(key)
        ))
    }
}
