//! Builds the configured blob store.

use std::sync::Arc;

use tracing::info;

use cloudio_core::config::StorageConfig;
use cloudio_core::error::AppError;
use cloudio_core::result::AppResult;
use cloudio_core::traits::BlobStore;

use crate::providers::LocalBlobStore;

/// The active blob store, plus the concrete local store when that is the
/// provider (the API serves local blobs itself).
#[derive(Debug, Clone)]
pub struct BlobBackend {
    /// Store used by the services.
    pub store: Arc<dyn BlobStore>,
    /// Set when blobs are served from the local filesystem.
    pub local: Option<Arc<LocalBlobStore>>,
}

impl BlobBackend {
    /// Wrap a local store.
    pub fn from_local(store: LocalBlobStore) -> Self {
        let store = Arc::new(store);
        Self {
            store: store.clone(),
            local: Some(store),
        }
    }
}

/// Create the blob store named by `config.default_provider`.
pub async fn build_blob_store(config: &StorageConfig, public_url: &str) -> AppResult<BlobBackend> {
    let backend = match config.default_provider.as_str() {
        "local" => BlobBackend::from_local(
            LocalBlobStore::new(
                &config.local.root_path,
                public_url,
                &config.local.signing_secret,
            )
            .await?,
        ),
        #[cfg(feature = "s3")]
        "s3" => BlobBackend {
            store: Arc::new(crate::providers::S3BlobStore::new(&config.s3).await?),
            local: None,
        },
        other => {
            return Err(AppError::configuration(format!(
                "Unsupported blob provider: {other}"
            )));
        }
    };
    info!(provider = backend.store.provider_type(), "Blob store ready");
    Ok(backend)
}
