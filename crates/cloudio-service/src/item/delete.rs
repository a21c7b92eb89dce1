//! Deleting files and folders, including cascading subtree removal.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use cloudio_core::result::AppResult;
use cloudio_core::types::{ItemRef, OwnerId};
use cloudio_database::ChangeSet;
use cloudio_entity::Entry;

use super::service::ItemService;
use crate::context::RequestContext;

impl ItemService {
    /// Deletes an item. Deleting a folder removes its entire subtree in one
    /// atomic change set.
    ///
    /// Blob cleanup happens after the records are gone and never fails the
    /// call: a blob is only removed once no remaining file references it,
    /// and a storage error is logged and swallowed.
    pub async fn delete_item(&self, ctx: &RequestContext, item: ItemRef) -> AppResult<()> {
        let entry = self.get(ctx, item).await?;

        match entry {
            Entry::File(file) => {
                self.store.delete(&ctx.owner_id, item).await?;
                info!(user_id = %ctx.owner_id, file_id = %file.id, "File deleted");

                self.release_blob(&ctx.owner_id, &file.blob_key).await;
            }
            Entry::Folder(folder) => {
                let subtree = self.tree.enumerate_subtree(folder.id, &ctx.owner_id).await?;

                let mut changes = ChangeSet::new();
                for file in &subtree.files {
                    changes.delete(ItemRef::File(file.id));
                }
                // Children before parents.
                for child in subtree.folders.iter().rev() {
                    changes.delete(ItemRef::Folder(child.id));
                }
                changes.delete(item);

                self.store.apply(&ctx.owner_id, changes).await?;

                info!(
                    user_id = %ctx.owner_id,
                    folder_id = %folder.id,
                    folders = subtree.folders.len() + 1,
                    files = subtree.files.len(),
                    "Folder deleted"
                );

                let keys: BTreeSet<&str> = subtree
                    .files
                    .iter()
                    .map(|file| file.blob_key.as_str())
                    .collect();
                for key in keys {
                    self.release_blob(&ctx.owner_id, key).await;
                }
            }
        }

        Ok(())
    }

    /// Remove `blob_key` from blob storage if no file record still points at
    /// it.
    async fn release_blob(&self, owner: &OwnerId, blob_key: &str) {
        let references = match self.store.blob_reference_count(owner, blob_key).await {
            Ok(count) => count,
            Err(e) => {
                warn!(blob_key = %blob_key, error = %e, "Failed to count blob references, keeping blob");
                return;
            }
        };

        if references > 0 {
            debug!(blob_key = %blob_key, references, "Blob still referenced, keeping it");
            return;
        }

        if let Err(e) = self.blobs.delete(blob_key).await {
            warn!(
                blob_key = %blob_key,
                provider = %self.blobs.provider_type(),
                error = %e,
                "Failed to delete blob, leaving it orphaned"
            );
        }
    }
}
