//! File upload service.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{info, warn};

use cloudio_core::config::{LimitsConfig, StorageConfig};
use cloudio_core::error::AppError;
use cloudio_core::result::AppResult;
use cloudio_core::traits::BlobStore;
use cloudio_core::types::{FileId, FolderId, ItemKind};
use cloudio_database::EntityStore;
use cloudio_entity::{ContentType, Entry, File};

use crate::context::RequestContext;
use crate::naming::validate_name;
use crate::tree::TreeIntegrity;

/// Stores uploaded content in the blob store and records it as a file.
#[derive(Debug, Clone)]
pub struct UploadService {
    store: Arc<dyn EntityStore>,
    blobs: Arc<dyn BlobStore>,
    tree: TreeIntegrity,
    max_upload_size_bytes: u64,
    key_prefix: String,
}

impl UploadService {
    /// Creates a new upload service.
    pub fn new(
        store: Arc<dyn EntityStore>,
        blobs: Arc<dyn BlobStore>,
        storage: &StorageConfig,
        limits: LimitsConfig,
    ) -> Self {
        Self {
            tree: TreeIntegrity::new(store.clone(), limits),
            store,
            blobs,
            max_upload_size_bytes: storage.max_upload_size_bytes,
            key_prefix: storage.key_prefix.clone(),
        }
    }

    /// Uploads `data` as a new file named `name` under `parent`.
    pub async fn upload(
        &self,
        ctx: &RequestContext,
        name: &str,
        data: Bytes,
        parent: Option<FolderId>,
    ) -> AppResult<File> {
        validate_name(name)?;

        let size = data.len() as u64;
        if size == 0 {
            return Err(AppError::validation("File is empty"));
        }
        if size > self.max_upload_size_bytes {
            return Err(AppError::validation(format!(
                "File exceeds maximum upload size of {} bytes",
                self.max_upload_size_bytes
            )));
        }

        if let Some(parent) = parent {
            self.tree.require_folder(parent, &ctx.owner_id).await?;
        }
        if self
            .tree
            .find_sibling_by_name(name, parent, &ctx.owner_id, ItemKind::File, None)
            .await?
            .is_some()
        {
            return Err(AppError::conflict(format!(
                "A file named '{name}' already exists in this location"
            )));
        }

        let hint = format!("{}/{}", self.key_prefix, ctx.owner_id);
        let blob = self.blobs.upload(data, &hint).await?;

        let file = File {
            id: FileId::new(),
            name: name.to_string(),
            size,
            content_type: ContentType::from_file_name(name),
            blob_key: blob.key,
            url: blob.url,
            parent_id: parent,
            owner_id: ctx.owner_id.clone(),
            created_at: ctx.request_time,
            modified_at: ctx.request_time,
        };

        if let Err(e) = self
            .store
            .insert(&ctx.owner_id, Entry::File(file.clone()))
            .await
        {
            if let Err(cleanup) = self.blobs.delete(&file.blob_key).await {
                warn!(
                    blob_key = %file.blob_key,
                    error = %cleanup,
                    "Failed to remove blob after rejected upload"
                );
            }
            return Err(e);
        }

        info!(
            user_id = %ctx.owner_id,
            file_id = %file.id,
            name = %file.name,
            size = file.size,
            content_type = %file.content_type.as_str(),
            "Upload completed"
        );
        Ok(file)
    }
}
