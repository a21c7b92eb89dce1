//! Folder and file mutations: create, rename, move, plus reads.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use cloudio_core::config::LimitsConfig;
use cloudio_core::error::AppError;
use cloudio_core::result::AppResult;
use cloudio_core::traits::BlobStore;
use cloudio_core::types::{FolderId, ItemKind, ItemRef};
use cloudio_database::{EntityStore, EntryPatch};
use cloudio_entity::{Entry, Folder};

use crate::context::RequestContext;
use crate::naming::validate_name;
use crate::tree::TreeIntegrity;

/// Orchestrates every structural change to a user's tree.
///
/// Each operation validates first, then commits through one atomic
/// [`EntityStore::apply`] call. The pre-checks give callers precise errors;
/// the store's uniqueness constraint remains the final guard.
#[derive(Debug, Clone)]
pub struct ItemService {
    pub(super) store: Arc<dyn EntityStore>,
    pub(super) blobs: Arc<dyn BlobStore>,
    pub(super) tree: TreeIntegrity,
}

impl ItemService {
    /// Creates a new item service.
    pub fn new(
        store: Arc<dyn EntityStore>,
        blobs: Arc<dyn BlobStore>,
        limits: LimitsConfig,
    ) -> Self {
        Self {
            tree: TreeIntegrity::new(store.clone(), limits),
            store,
            blobs,
        }
    }

    /// The tree engine this service validates against.
    pub fn tree(&self) -> &TreeIntegrity {
        &self.tree
    }

    /// Fetches an item owned by the caller.
    pub async fn get(&self, ctx: &RequestContext, item: ItemRef) -> AppResult<Entry> {
        self.store
            .get(item, &ctx.owner_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("{} {} not found", item.kind().label(), item.uuid())))
    }

    /// Lists the `kind` children of `parent` (None = top level), by name.
    pub async fn list_children(
        &self,
        ctx: &RequestContext,
        parent: Option<FolderId>,
        kind: ItemKind,
    ) -> AppResult<Vec<Entry>> {
        if let Some(parent) = parent {
            self.tree.require_folder(parent, &ctx.owner_id).await?;
        }
        self.store.list_children(parent, &ctx.owner_id, kind).await
    }

    /// The folder chain from the top level down to `folder`.
    pub async fn breadcrumbs(
        &self,
        ctx: &RequestContext,
        folder: FolderId,
    ) -> AppResult<Vec<Folder>> {
        self.tree.ancestors(folder, &ctx.owner_id).await
    }

    /// Creates a folder named `name` under `parent`.
    pub async fn create_folder(
        &self,
        ctx: &RequestContext,
        name: &str,
        parent: Option<FolderId>,
    ) -> AppResult<Folder> {
        validate_name(name)?;
        if let Some(parent) = parent {
            self.tree.require_folder(parent, &ctx.owner_id).await?;
        }
        self.ensure_name_free(ctx, name, parent, ItemKind::Folder, None)
            .await?;

        let folder = Folder::new(ctx.owner_id.clone(), name, parent, ctx.request_time);
        self.store
            .insert(&ctx.owner_id, Entry::Folder(folder.clone()))
            .await?;

        info!(
            user_id = %ctx.owner_id,
            folder_id = %folder.id,
            parent_id = ?parent,
            "Folder created"
        );
        Ok(folder)
    }

    /// Renames an item in place.
    ///
    /// Renaming to the current name succeeds without touching the record.
    pub async fn rename(
        &self,
        ctx: &RequestContext,
        item: ItemRef,
        new_name: &str,
    ) -> AppResult<Entry> {
        let entry = self.get(ctx, item).await?;
        validate_name(new_name)?;

        if entry.name() == new_name {
            debug!(user_id = %ctx.owner_id, item = %item, "Rename to same name, nothing to do");
            return Ok(entry);
        }

        self.ensure_name_free(ctx, new_name, entry.parent_id(), item.kind(), Some(item))
            .await?;

        self.store
            .update(
                &ctx.owner_id,
                item,
                EntryPatch::rename(new_name, ctx.request_time),
            )
            .await?;

        info!(
            user_id = %ctx.owner_id,
            item = %item,
            old_name = %entry.name(),
            new_name = %new_name,
            "Item renamed"
        );
        Ok(patched(entry, Some(new_name), None, ctx.request_time))
    }

    /// Moves an item under `target` (None = top level).
    ///
    /// A folder may not be moved into itself or any of its descendants.
    /// Moving an item to the parent it already has succeeds without
    /// touching the record.
    pub async fn move_item(
        &self,
        ctx: &RequestContext,
        item: ItemRef,
        target: Option<FolderId>,
    ) -> AppResult<Entry> {
        let entry = self.get(ctx, item).await?;
        if let Some(target) = target {
            self.tree.require_folder(target, &ctx.owner_id).await?;

            if let ItemRef::Folder(folder_id) = item {
                if self
                    .tree
                    .is_descendant(folder_id, target, &ctx.owner_id)
                    .await?
                {
                    return Err(AppError::invalid_operation(
                        "Cannot move a folder into itself or one of its subfolders",
                    ));
                }
            }
        }

        if entry.parent_id() == target {
            debug!(user_id = %ctx.owner_id, item = %item, "Move to current parent, nothing to do");
            return Ok(entry);
        }

        self.ensure_name_free(ctx, entry.name(), target, item.kind(), Some(item))
            .await?;

        self.store
            .update(
                &ctx.owner_id,
                item,
                EntryPatch::reparent(target, ctx.request_time),
            )
            .await?;

        info!(
            user_id = %ctx.owner_id,
            item = %item,
            from = ?entry.parent_id(),
            to = ?target,
            "Item moved"
        );
        Ok(patched(entry, None, Some(target), ctx.request_time))
    }

    /// Fails with `Conflict` when a sibling of `kind` named `name` already
    /// exists under `parent`.
    pub(super) async fn ensure_name_free(
        &self,
        ctx: &RequestContext,
        name: &str,
        parent: Option<FolderId>,
        kind: ItemKind,
        exclude: Option<ItemRef>,
    ) -> AppResult<()> {
        let existing = self
            .tree
            .find_sibling_by_name(name, parent, &ctx.owner_id, kind, exclude)
            .await?;
        match existing {
            Some(_) => Err(AppError::conflict(format!(
                "A {kind} named '{name}' already exists in this location"
            ))),
            None => Ok(()),
        }
    }
}

/// Apply a committed patch to the in-memory copy of a record.
fn patched(
    entry: Entry,
    name: Option<&str>,
    parent_id: Option<Option<FolderId>>,
    modified_at: DateTime<Utc>,
) -> Entry {
    match entry {
        Entry::Folder(mut folder) => {
            if let Some(name) = name {
                folder.name = name.to_string();
            }
            if let Some(parent_id) = parent_id {
                folder.parent_id = parent_id;
            }
            folder.modified_at = modified_at;
            Entry::Folder(folder)
        }
        Entry::File(mut file) => {
            if let Some(name) = name {
                file.name = name.to_string();
            }
            if let Some(parent_id) = parent_id {
                file.parent_id = parent_id;
            }
            file.modified_at = modified_at;
            Entry::File(file)
        }
    }
}
