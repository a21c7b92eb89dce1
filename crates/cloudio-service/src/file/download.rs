//! Signed download links for stored files.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use cloudio_core::error::AppError;
use cloudio_core::result::AppResult;
use cloudio_core::traits::BlobStore;
use cloudio_core::types::{FileId, ItemRef};
use cloudio_database::EntityStore;
use cloudio_entity::Entry;

use crate::context::RequestContext;

/// A time-limited link to a file's content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadLink {
    /// Signed URL.
    pub url: String,
    /// Suggested filename for the client.
    pub file_name: String,
    /// Seconds until `url` stops working.
    pub expires_in: u64,
}

/// Issues signed download URLs.
#[derive(Debug, Clone)]
pub struct DownloadService {
    store: Arc<dyn EntityStore>,
    blobs: Arc<dyn BlobStore>,
    ttl_seconds: u64,
}

impl DownloadService {
    /// Creates a new download service whose links live `ttl_seconds`.
    pub fn new(store: Arc<dyn EntityStore>, blobs: Arc<dyn BlobStore>, ttl_seconds: u64) -> Self {
        Self {
            store,
            blobs,
            ttl_seconds,
        }
    }

    /// Signs a download URL for a file owned by the caller.
    pub async fn download_url(&self, ctx: &RequestContext, file_id: FileId) -> AppResult<DownloadLink> {
        let file = self
            .store
            .get(ItemRef::File(file_id), &ctx.owner_id)
            .await?
            .and_then(Entry::into_file)
            .ok_or_else(|| AppError::not_found(format!("File {file_id} not found")))?;

        let url = self.blobs.sign(&file.blob_key, self.ttl_seconds).await?;
        debug!(user_id = %ctx.owner_id, file_id = %file.id, "Download URL signed");

        Ok(DownloadLink {
            url,
            file_name: file.name,
            expires_in: self.ttl_seconds,
        })
    }
}
