//! Copying files and whole folder subtrees.

use std::collections::HashMap;

use tracing::info;

use cloudio_core::error::AppError;
use cloudio_core::result::AppResult;
use cloudio_core::types::{FileId, FolderId, ItemRef};
use cloudio_database::ChangeSet;
use cloudio_entity::{Entry, File, Folder};

use super::service::ItemService;
use crate::context::RequestContext;
use crate::naming::{generate_copy_name, validate_name};
use crate::tree::Subtree;

impl ItemService {
    /// Copies an item under `target` (None = top level).
    ///
    /// The copy is named `"<name> (copy)"` (or the next free `"(copy N)"`)
    /// among its new siblings. File copies share the source's blob. Folder
    /// copies clone the whole subtree, keeping descendant names, and commit
    /// every new record in one change set so a failure leaves nothing
    /// behind.
    ///
    /// Every source file is required to still exist when the change set
    /// commits. A delete that wins the race turns the copy into `NotFound`
    /// instead of leaving an alias of a released blob.
    pub async fn copy_item(
        &self,
        ctx: &RequestContext,
        item: ItemRef,
        target: Option<FolderId>,
    ) -> AppResult<Entry> {
        let entry = self.get(ctx, item).await?;
        if let Some(target) = target {
            self.tree.require_folder(target, &ctx.owner_id).await?;
        }

        let siblings = self
            .tree
            .sibling_names(target, &ctx.owner_id, item.kind())
            .await?;
        let copy_name = generate_copy_name(entry.name(), siblings.iter().map(String::as_str));
        validate_name(&copy_name)?;

        match entry {
            Entry::File(source) => {
                let copy = clone_file(&source, copy_name, target, ctx);
                let mut changes = ChangeSet::new();
                changes
                    .require(ItemRef::File(source.id))
                    .insert_file(copy.clone());
                self.store.apply(&ctx.owner_id, changes).await?;

                info!(
                    user_id = %ctx.owner_id,
                    source_id = %source.id,
                    file_id = %copy.id,
                    parent_id = ?target,
                    "File copied"
                );
                Ok(Entry::File(copy))
            }
            Entry::Folder(source) => {
                let subtree = self.tree.enumerate_subtree(source.id, &ctx.owner_id).await?;
                let plan = plan_folder_copy(&source, &subtree, copy_name, target, ctx)?;
                let folders = subtree.folders.len() + 1;
                let files = subtree.files.len();

                self.store.apply(&ctx.owner_id, plan.changes).await?;

                info!(
                    user_id = %ctx.owner_id,
                    source_id = %source.id,
                    folder_id = %plan.root.id,
                    parent_id = ?target,
                    folders,
                    files,
                    "Folder copied"
                );
                Ok(Entry::Folder(plan.root))
            }
        }
    }
}

/// The records to insert for a folder copy.
#[derive(Debug)]
struct FolderCopyPlan {
    root: Folder,
    changes: ChangeSet,
}

/// Build the clone of `source` and its subtree.
///
/// Every cloned record gets a fresh id; parent links are remapped through
/// an old-to-new table so each clone hangs off its cloned parent. The
/// source root and files are required first, then folders are queued
/// parents-first, then files.
fn plan_folder_copy(
    source: &Folder,
    subtree: &Subtree,
    copy_name: String,
    target: Option<FolderId>,
    ctx: &RequestContext,
) -> AppResult<FolderCopyPlan> {
    let root = Folder::new(ctx.owner_id.clone(), copy_name, target, ctx.request_time);

    let mut remap: HashMap<FolderId, FolderId> = HashMap::with_capacity(subtree.folders.len() + 1);
    remap.insert(source.id, root.id);

    let mut changes = ChangeSet::new();
    changes.require(ItemRef::Folder(source.id));
    for file in &subtree.files {
        changes.require(ItemRef::File(file.id));
    }
    changes.insert_folder(root.clone());

    for folder in &subtree.folders {
        let parent = remapped_parent(&remap, folder.parent_id)?;
        let clone = Folder::new(
            ctx.owner_id.clone(),
            folder.name.clone(),
            Some(parent),
            ctx.request_time,
        );
        remap.insert(folder.id, clone.id);
        changes.insert_folder(clone);
    }

    for file in &subtree.files {
        let parent = remapped_parent(&remap, file.parent_id)?;
        changes.insert_file(clone_file(file, file.name.clone(), Some(parent), ctx));
    }

    Ok(FolderCopyPlan { root, changes })
}

fn remapped_parent(
    remap: &HashMap<FolderId, FolderId>,
    parent: Option<FolderId>,
) -> AppResult<FolderId> {
    parent
        .and_then(|id| remap.get(&id).copied())
        .ok_or_else(|| AppError::internal("Subtree record has a parent outside the copied tree"))
}

fn clone_file(
    source: &File,
    name: String,
    parent_id: Option<FolderId>,
    ctx: &RequestContext,
) -> File {
    File {
        id: FileId::new(),
        name,
        size: source.size,
        content_type: source.content_type,
        blob_key: source.blob_key.clone(),
        url: source.url.clone(),
        parent_id,
        owner_id: ctx.owner_id.clone(),
        created_at: ctx.request_time,
        modified_at: ctx.request_time,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::testing::{FakeBlobStore, FlakyStore, ctx, limits, seed_file, seed_folder};
    use cloudio_core::error::ErrorKind;
    use cloudio_core::types::ItemKind;
    use cloudio_database::{EntityStore, MemoryEntityStore};

    fn make_service() -> (Arc<MemoryEntityStore>, ItemService) {
        let store = Arc::new(MemoryEntityStore::new());
        let service = ItemService::new(store.clone(), FakeBlobStore::new(), limits());
        (store, service)
    }

    #[tokio::test]
    async fn test_file_copy_names_and_aliases_blob() {
        let (store, service) = make_service();
        let alice = ctx("alice");
        let file = seed_file(store.as_ref(), &alice.owner_id, "A", None, "blob-a").await;
        seed_file(store.as_ref(), &alice.owner_id, "A (copy)", None, "x").await;
        seed_file(store.as_ref(), &alice.owner_id, "A (copy 2)", None, "y").await;

        let copy = service
            .copy_item(&alice, ItemRef::File(file.id), None)
            .await
            .unwrap()
            .into_file()
            .unwrap();
        assert_eq!(copy.name, "A (copy 3)");
        assert_ne!(copy.id, file.id);
        assert_eq!(copy.blob_key, file.blob_key);
        assert_eq!(copy.size, file.size);
        assert_eq!(copy.content_type, file.content_type);
        assert_eq!(copy.created_at, alice.request_time);
        assert_eq!(
            store
                .blob_reference_count(&alice.owner_id, "blob-a")
                .await
                .unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn test_copy_into_other_folder_uses_its_siblings() {
        let (store, service) = make_service();
        let alice = ctx("alice");
        let owner = &alice.owner_id;
        let target = seed_folder(store.as_ref(), owner, "T", None).await;
        let file = seed_file(store.as_ref(), owner, "notes.md", None, "k").await;

        let copy = service
            .copy_item(&alice, ItemRef::File(file.id), Some(target.id))
            .await
            .unwrap();
        assert_eq!(copy.name(), "notes.md (copy)");
        assert_eq!(copy.parent_id(), Some(target.id));

        let err = service
            .copy_item(&alice, ItemRef::File(file.id), Some(FolderId::new()))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_recursive_copy_remaps_ids() {
        let (store, service) = make_service();
        let alice = ctx("alice");
        let owner = &alice.owner_id;
        let f = seed_folder(store.as_ref(), owner, "F", None).await;
        let f1 = seed_folder(store.as_ref(), owner, "F1", Some(f.id)).await;
        let file1 = seed_file(store.as_ref(), owner, "f1.txt", Some(f1.id), "k1").await;
        let t = seed_folder(store.as_ref(), owner, "T", None).await;

        let root = service
            .copy_item(&alice, ItemRef::Folder(f.id), Some(t.id))
            .await
            .unwrap()
            .into_folder()
            .unwrap();
        assert_eq!(root.name, "F (copy)");
        assert_eq!(root.parent_id, Some(t.id));
        assert_ne!(root.id, f.id);

        let children = service
            .list_children(&alice, Some(root.id), ItemKind::Folder)
            .await
            .unwrap();
        assert_eq!(children.len(), 1);
        let f1_copy = children.into_iter().next().unwrap().into_folder().unwrap();
        assert_eq!(f1_copy.name, "F1");
        assert_ne!(f1_copy.id, f1.id);

        let files = service
            .list_children(&alice, Some(f1_copy.id), ItemKind::File)
            .await
            .unwrap();
        assert_eq!(files.len(), 1);
        let file1_copy = files.into_iter().next().unwrap().into_file().unwrap();
        assert_eq!(file1_copy.name, "f1.txt");
        assert_ne!(file1_copy.id, file1.id);
        assert_eq!(file1_copy.blob_key, file1.blob_key);

        // The source is untouched.
        let original = service
            .list_children(&alice, Some(f1.id), ItemKind::File)
            .await
            .unwrap();
        assert_eq!(original, vec![Entry::File(file1)]);
    }

    #[tokio::test]
    async fn test_copy_folder_into_its_own_subtree_is_finite() {
        let (store, service) = make_service();
        let alice = ctx("alice");
        let owner = &alice.owner_id;
        let f = seed_folder(store.as_ref(), owner, "F", None).await;
        let f1 = seed_folder(store.as_ref(), owner, "F1", Some(f.id)).await;

        let copy = service
            .copy_item(&alice, ItemRef::Folder(f.id), Some(f1.id))
            .await
            .unwrap();
        assert_eq!(copy.parent_id(), Some(f1.id));
        assert_eq!(store.folder_count(owner).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_failed_copy_commits_nothing() {
        let store = FlakyStore::new();
        let service = ItemService::new(store.clone(), FakeBlobStore::new(), limits());
        let alice = ctx("alice");
        let owner = &alice.owner_id;
        let f = seed_folder(store.as_ref(), owner, "F", None).await;
        let f1 = seed_folder(store.as_ref(), owner, "F1", Some(f.id)).await;
        seed_file(store.as_ref(), owner, "a.txt", Some(f1.id), "k").await;

        store.fail_apply.store(true, Ordering::SeqCst);
        let err = service
            .copy_item(&alice, ItemRef::Folder(f.id), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::DependencyFailure);

        store.fail_apply.store(false, Ordering::SeqCst);
        assert_eq!(store.folder_count(owner).await.unwrap(), 2);
        assert_eq!(store.blob_reference_count(owner, "k").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_copy_name_too_long_is_rejected() {
        let (store, service) = make_service();
        let alice = ctx("alice");
        let name = "n".repeat(250);
        let file = seed_file(store.as_ref(), &alice.owner_id, &name, None, "k").await;

        let err = service
            .copy_item(&alice, ItemRef::File(file.id), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidName);
    }
}
