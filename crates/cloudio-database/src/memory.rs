//! In-memory entity store for development and tests.
//!
//! Applies each [`ChangeSet`] to a scratch copy of the tables under a single
//! write lock and swaps the copy in only when every mutation succeeded, so
//! readers never observe a half-applied batch. Enforces the same sibling
//! uniqueness, parent existence and acyclic parent rules as the PostgreSQL
//! backend.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use cloudio_core::error::AppError;
use cloudio_core::result::AppResult;
use cloudio_core::types::{FileId, FolderId, ItemKind, ItemRef, OwnerId};
use cloudio_entity::{Entry, File, Folder};

use crate::store::{ChangeSet, EntityStore, EntryPatch, Mutation, SearchHits, TypeTotals};

#[derive(Debug, Clone, Default)]
struct Tables {
    folders: HashMap<FolderId, Folder>,
    files: HashMap<FileId, File>,
}

impl Tables {
    fn folder(&self, id: FolderId, owner: &OwnerId) -> Option<&Folder> {
        self.folders.get(&id).filter(|f| &f.owner_id == owner)
    }

    fn file(&self, id: FileId, owner: &OwnerId) -> Option<&File> {
        self.files.get(&id).filter(|f| &f.owner_id == owner)
    }

    fn require_parent(&self, parent: Option<FolderId>, owner: &OwnerId) -> AppResult<()> {
        match parent {
            Some(id) if self.folder(id, owner).is_none() => {
                Err(AppError::not_found(format!("Parent folder {id} not found")))
            }
            _ => Ok(()),
        }
    }

    /// Whether walking up from `start` reaches `folder`.
    fn is_ancestor_or_self(&self, folder: FolderId, start: FolderId) -> AppResult<bool> {
        let mut visited = HashSet::new();
        let mut current = Some(start);
        while let Some(id) = current {
            if id == folder {
                return Ok(true);
            }
            if !visited.insert(id) {
                return Err(AppError::internal(format!(
                    "Folder tree contains a cycle at {id}"
                )));
            }
            current = self.folders.get(&id).and_then(|f| f.parent_id);
        }
        Ok(false)
    }

    fn folder_name_taken(
        &self,
        owner: &OwnerId,
        parent: Option<FolderId>,
        name: &str,
        except: FolderId,
    ) -> bool {
        self.folders.values().any(|f| {
            f.id != except && &f.owner_id == owner && f.parent_id == parent && f.name == name
        })
    }

    fn file_name_taken(
        &self,
        owner: &OwnerId,
        parent: Option<FolderId>,
        name: &str,
        except: FileId,
    ) -> bool {
        self.files.values().any(|f| {
            f.id != except && &f.owner_id == owner && f.parent_id == parent && f.name == name
        })
    }

    fn apply(&mut self, owner: &OwnerId, mutation: Mutation) -> AppResult<()> {
        match mutation {
            Mutation::InsertFolder(folder) => {
                check_owner(owner, &folder.owner_id)?;
                if self.folders.contains_key(&folder.id) {
                    return Err(AppError::conflict(format!(
                        "Folder {} already exists",
                        folder.id
                    )));
                }
                self.require_parent(folder.parent_id, owner)?;
                if self.folder_name_taken(owner, folder.parent_id, &folder.name, folder.id) {
                    return Err(name_conflict(ItemKind::Folder, &folder.name));
                }
                self.folders.insert(folder.id, folder);
            }
            Mutation::InsertFile(file) => {
                check_owner(owner, &file.owner_id)?;
                if self.files.contains_key(&file.id) {
                    return Err(AppError::conflict(format!("File {} already exists", file.id)));
                }
                self.require_parent(file.parent_id, owner)?;
                if self.file_name_taken(owner, file.parent_id, &file.name, file.id) {
                    return Err(name_conflict(ItemKind::File, &file.name));
                }
                self.files.insert(file.id, file);
            }
            Mutation::Update {
                item: ItemRef::Folder(id),
                patch,
            } => {
                let current = self
                    .folder(id, owner)
                    .cloned()
                    .ok_or_else(|| AppError::not_found(format!("Folder {id} not found")))?;
                let moved = patch.parent_id.is_some();
                let updated = patch_folder(current, patch);
                self.require_parent(updated.parent_id, owner)?;
                if let (true, Some(parent)) = (moved, updated.parent_id) {
                    if self.is_ancestor_or_self(id, parent)? {
                        return Err(AppError::invalid_operation(
                            "Cannot move a folder into itself or one of its subfolders",
                        ));
                    }
                }
                if self.folder_name_taken(owner, updated.parent_id, &updated.name, id) {
                    return Err(name_conflict(ItemKind::Folder, &updated.name));
                }
                self.folders.insert(id, updated);
            }
            Mutation::Update {
                item: ItemRef::File(id),
                patch,
            } => {
                let current = self
                    .file(id, owner)
                    .cloned()
                    .ok_or_else(|| AppError::not_found(format!("File {id} not found")))?;
                let updated = patch_file(current, patch);
                self.require_parent(updated.parent_id, owner)?;
                if self.file_name_taken(owner, updated.parent_id, &updated.name, id) {
                    return Err(name_conflict(ItemKind::File, &updated.name));
                }
                self.files.insert(id, updated);
            }
            Mutation::Delete(ItemRef::Folder(id)) => {
                if self.folder(id, owner).is_none() {
                    return Err(AppError::not_found(format!("Folder {id} not found")));
                }
                let has_children = self.folders.values().any(|f| f.parent_id == Some(id))
                    || self.files.values().any(|f| f.parent_id == Some(id));
                if has_children {
                    return Err(AppError::internal(format!(
                        "Folder {id} still has children"
                    )));
                }
                self.folders.remove(&id);
            }
            Mutation::Delete(ItemRef::File(id)) => {
                if self.file(id, owner).is_none() {
                    return Err(AppError::not_found(format!("File {id} not found")));
                }
                self.files.remove(&id);
            }
            Mutation::Require(ItemRef::Folder(id)) => {
                if self.folder(id, owner).is_none() {
                    return Err(AppError::not_found(format!("Folder {id} not found")));
                }
            }
            Mutation::Require(ItemRef::File(id)) => {
                if self.file(id, owner).is_none() {
                    return Err(AppError::not_found(format!("File {id} not found")));
                }
            }
        }
        Ok(())
    }
}

fn check_owner(owner: &OwnerId, record_owner: &OwnerId) -> AppResult<()> {
    if owner != record_owner {
        return Err(AppError::internal(
            "Record owner does not match the change set owner",
        ));
    }
    Ok(())
}

fn name_conflict(kind: ItemKind, name: &str) -> AppError {
    AppError::conflict(format!(
        "A {kind} named '{name}' already exists in this location"
    ))
}

fn patch_folder(mut folder: Folder, patch: EntryPatch) -> Folder {
    if let Some(name) = patch.name {
        folder.name = name;
    }
    if let Some(parent_id) = patch.parent_id {
        folder.parent_id = parent_id;
    }
    folder.modified_at = patch.modified_at;
    folder
}

fn patch_file(mut file: File, patch: EntryPatch) -> File {
    if let Some(name) = patch.name {
        file.name = name;
    }
    if let Some(parent_id) = patch.parent_id {
        file.parent_id = parent_id;
    }
    file.modified_at = patch.modified_at;
    file
}

/// Entity store backed by process memory.
#[derive(Debug, Default)]
pub struct MemoryEntityStore {
    tables: RwLock<Tables>,
}

impl MemoryEntityStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntityStore for MemoryEntityStore {
    fn backend(&self) -> &str {
        "memory"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn get(&self, item: ItemRef, owner: &OwnerId) -> AppResult<Option<Entry>> {
        let tables = self.tables.read().await;
        Ok(match item {
            ItemRef::Folder(id) => tables.folder(id, owner).cloned().map(Entry::Folder),
            ItemRef::File(id) => tables.file(id, owner).cloned().map(Entry::File),
        })
    }

    async fn list_children(
        &self,
        parent: Option<FolderId>,
        owner: &OwnerId,
        kind: ItemKind,
    ) -> AppResult<Vec<Entry>> {
        let tables = self.tables.read().await;
        let mut children: Vec<Entry> = match kind {
            ItemKind::Folder => tables
                .folders
                .values()
                .filter(|f| &f.owner_id == owner && f.parent_id == parent)
                .cloned()
                .map(Entry::Folder)
                .collect(),
            ItemKind::File => tables
                .files
                .values()
                .filter(|f| &f.owner_id == owner && f.parent_id == parent)
                .cloned()
                .map(Entry::File)
                .collect(),
        };
        children.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(children)
    }

    async fn apply(&self, owner: &OwnerId, changes: ChangeSet) -> AppResult<()> {
        let count = changes.len();
        let mut tables = self.tables.write().await;
        let mut scratch = tables.clone();
        for mutation in changes.into_mutations() {
            scratch.apply(owner, mutation)?;
        }
        *tables = scratch;
        debug!(owner = %owner, mutations = count, "Applied change set");
        Ok(())
    }

    async fn search(
        &self,
        owner: &OwnerId,
        query: &str,
        folder_limit: usize,
        file_limit: usize,
    ) -> AppResult<SearchHits> {
        let needle = query.to_lowercase();
        let tables = self.tables.read().await;

        let mut folders: Vec<Folder> = tables
            .folders
            .values()
            .filter(|f| &f.owner_id == owner && f.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        folders.sort_by(|a, b| a.name.cmp(&b.name));
        folders.truncate(folder_limit);

        let mut files: Vec<File> = tables
            .files
            .values()
            .filter(|f| &f.owner_id == owner && f.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        files.sort_by(|a, b| a.name.cmp(&b.name));
        files.truncate(file_limit);

        Ok(SearchHits { folders, files })
    }

    async fn usage_by_type(&self, owner: &OwnerId) -> AppResult<TypeTotals> {
        let tables = self.tables.read().await;
        let mut totals: HashMap<_, (u64, u64)> = HashMap::new();
        for file in tables.files.values().filter(|f| &f.owner_id == owner) {
            let entry = totals.entry(file.content_type).or_default();
            entry.0 += file.size;
            entry.1 += 1;
        }
        Ok(totals
            .into_iter()
            .map(|(content_type, (size, count))| (content_type, size, count))
            .collect())
    }

    async fn folder_count(&self, owner: &OwnerId) -> AppResult<u64> {
        let tables = self.tables.read().await;
        Ok(tables.folders.values().filter(|f| &f.owner_id == owner).count() as u64)
    }

    async fn blob_reference_count(&self, owner: &OwnerId, blob_key: &str) -> AppResult<u64> {
        let tables = self.tables.read().await;
        Ok(tables
            .files
            .values()
            .filter(|f| &f.owner_id == owner && f.blob_key == blob_key)
            .count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use cloudio_core::error::ErrorKind;
    use cloudio_entity::ContentType;

    fn owner(name: &str) -> OwnerId {
        OwnerId::new(name).expect("owner")
    }

    fn file(owner: &OwnerId, name: &str, parent: Option<FolderId>, key: &str) -> File {
        let now = Utc::now();
        File {
            id: FileId::new(),
            name: name.to_string(),
            size: 100,
            content_type: ContentType::from_file_name(name),
            blob_key: key.to_string(),
            url: format!("http://blobs/{key}"),
            parent_id: parent,
            owner_id: owner.clone(),
            created_at: now,
            modified_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_is_owner_scoped() {
        let store = MemoryEntityStore::new();
        let alice = owner("alice");
        let folder = Folder::new(alice.clone(), "Docs", None, Utc::now());
        store
            .insert(&alice, Entry::Folder(folder.clone()))
            .await
            .unwrap();

        let found = store.get(ItemRef::Folder(folder.id), &alice).await.unwrap();
        assert_eq!(found, Some(Entry::Folder(folder.clone())));

        let foreign = store
            .get(ItemRef::Folder(folder.id), &owner("mallory"))
            .await
            .unwrap();
        assert_eq!(foreign, None);
    }

    #[tokio::test]
    async fn test_sibling_names_are_unique_per_kind() {
        let store = MemoryEntityStore::new();
        let alice = owner("alice");
        let now = Utc::now();
        store
            .insert(&alice, Folder::new(alice.clone(), "Docs", None, now).into())
            .await
            .unwrap();

        let err = store
            .insert(&alice, Folder::new(alice.clone(), "Docs", None, now).into())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);

        // Files live in their own name space.
        store
            .insert(&alice, file(&alice, "Docs", None, "k1").into())
            .await
            .unwrap();

        // Another user may reuse the name.
        let bob = owner("bob");
        store
            .insert(&bob, Folder::new(bob.clone(), "Docs", None, now).into())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_failed_change_set_leaves_nothing_behind() {
        let store = MemoryEntityStore::new();
        let alice = owner("alice");
        let now = Utc::now();
        let parent = Folder::new(alice.clone(), "A", None, now);
        let child = Folder::new(alice.clone(), "B", Some(parent.id), now);
        let duplicate = Folder::new(alice.clone(), "B", Some(parent.id), now);

        let mut changes = ChangeSet::new();
        changes
            .insert_folder(parent.clone())
            .insert_folder(child)
            .insert_folder(duplicate);
        let err = store.apply(&alice, changes).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);

        assert!(
            store
                .get(ItemRef::Folder(parent.id), &alice)
                .await
                .unwrap()
                .is_none()
        );
        assert_eq!(store.folder_count(&alice).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_conflict_and_missing_parent() {
        let store = MemoryEntityStore::new();
        let alice = owner("alice");
        let now = Utc::now();
        let a = Folder::new(alice.clone(), "A", None, now);
        let b = Folder::new(alice.clone(), "B", None, now);
        let mut changes = ChangeSet::new();
        changes.insert_folder(a.clone()).insert_folder(b.clone());
        store.apply(&alice, changes).await.unwrap();

        let err = store
            .update(&alice, ItemRef::Folder(b.id), EntryPatch::rename("A", now))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);

        let err = store
            .update(
                &alice,
                ItemRef::Folder(b.id),
                EntryPatch::reparent(Some(FolderId::new()), now),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_reparent_into_own_subtree_is_rejected() {
        let store = MemoryEntityStore::new();
        let alice = owner("alice");
        let now = Utc::now();
        let a = Folder::new(alice.clone(), "A", None, now);
        let b = Folder::new(alice.clone(), "B", Some(a.id), now);
        let c = Folder::new(alice.clone(), "C", Some(b.id), now);
        let mut changes = ChangeSet::new();
        changes
            .insert_folder(a.clone())
            .insert_folder(b.clone())
            .insert_folder(c.clone());
        store.apply(&alice, changes).await.unwrap();

        for target in [a.id, b.id, c.id] {
            let err = store
                .update(&alice, ItemRef::Folder(a.id), EntryPatch::reparent(Some(target), now))
                .await
                .unwrap_err();
            assert_eq!(err.kind, ErrorKind::InvalidOperation);
        }

        // Renames never trip the ancestry check.
        store
            .update(&alice, ItemRef::Folder(c.id), EntryPatch::rename("C2", now))
            .await
            .unwrap();

        // Moving the leaf up is fine; then the old ancestor may go under it.
        store
            .update(&alice, ItemRef::Folder(c.id), EntryPatch::reparent(None, now))
            .await
            .unwrap();
        store
            .update(&alice, ItemRef::Folder(a.id), EntryPatch::reparent(Some(c.id), now))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_cycle_check_sees_earlier_mutations_in_the_batch() {
        let store = MemoryEntityStore::new();
        let alice = owner("alice");
        let now = Utc::now();
        let a = Folder::new(alice.clone(), "A", None, now);
        let b = Folder::new(alice.clone(), "B", None, now);
        let mut changes = ChangeSet::new();
        changes.insert_folder(a.clone()).insert_folder(b.clone());
        store.apply(&alice, changes).await.unwrap();

        let mut changes = ChangeSet::new();
        changes
            .update(ItemRef::Folder(a.id), EntryPatch::reparent(Some(b.id), now))
            .update(ItemRef::Folder(b.id), EntryPatch::reparent(Some(a.id), now));
        assert!(changes.reparents_folder());
        let err = store.apply(&alice, changes).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidOperation);

        let a_now = store.get(ItemRef::Folder(a.id), &alice).await.unwrap();
        assert_eq!(a_now.and_then(|e| e.parent_id()), None);
    }

    #[tokio::test]
    async fn test_require_guards_the_batch() {
        let store = MemoryEntityStore::new();
        let alice = owner("alice");
        let source = file(&alice, "a.txt", None, "k");
        store.insert(&alice, source.clone().into()).await.unwrap();
        store.delete(&alice, ItemRef::File(source.id)).await.unwrap();

        let alias = file(&alice, "a (copy).txt", None, "k");
        let mut changes = ChangeSet::new();
        changes
            .require(ItemRef::File(source.id))
            .insert_file(alias);
        let err = store.apply(&alice, changes).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(store.blob_reference_count(&alice, "k").await.unwrap(), 0);

        // A foreign record does not satisfy the precondition either.
        let bob = owner("bob");
        let theirs = file(&bob, "b.txt", None, "kb");
        store.insert(&bob, theirs.clone().into()).await.unwrap();
        let mut changes = ChangeSet::new();
        changes.require(ItemRef::File(theirs.id));
        let err = store.apply(&alice, changes).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_children_are_listed_bytewise() {
        let store = MemoryEntityStore::new();
        let alice = owner("alice");
        let now = Utc::now();
        let mut changes = ChangeSet::new();
        for name in ["beta", "Beta", "alpha", "_misc"] {
            changes.insert_folder(Folder::new(alice.clone(), name, None, now));
        }
        store.apply(&alice, changes).await.unwrap();

        let names: Vec<String> = store
            .list_children(None, &alice, ItemKind::Folder)
            .await
            .unwrap()
            .iter()
            .map(|e| e.name().to_string())
            .collect();
        assert_eq!(names, ["Beta", "_misc", "alpha", "beta"]);
    }

    #[tokio::test]
    async fn test_delete_non_empty_folder_is_rejected() {
        let store = MemoryEntityStore::new();
        let alice = owner("alice");
        let parent = Folder::new(alice.clone(), "A", None, Utc::now());
        let mut changes = ChangeSet::new();
        changes
            .insert_folder(parent.clone())
            .insert_file(file(&alice, "a.txt", Some(parent.id), "k"));
        store.apply(&alice, changes).await.unwrap();

        let err = store
            .delete(&alice, ItemRef::Folder(parent.id))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Internal);
    }

    #[tokio::test]
    async fn test_search_usage_and_references() {
        let store = MemoryEntityStore::new();
        let alice = owner("alice");
        let mut changes = ChangeSet::new();
        changes
            .insert_folder(Folder::new(alice.clone(), "Reports", None, Utc::now()))
            .insert_file(file(&alice, "q1-report.pdf", None, "shared"))
            .insert_file(file(&alice, "q1-report (copy).pdf", None, "shared"))
            .insert_file(file(&alice, "holiday.png", None, "img"));
        store.apply(&alice, changes).await.unwrap();

        let hits = store.search(&alice, "REPORT", 20, 30).await.unwrap();
        assert_eq!(hits.folders.len(), 1);
        assert_eq!(hits.files.len(), 2);

        let hits = store.search(&alice, "report", 20, 1).await.unwrap();
        assert_eq!(hits.files.len(), 1);

        assert_eq!(store.blob_reference_count(&alice, "shared").await.unwrap(), 2);
        assert_eq!(store.blob_reference_count(&owner("bob"), "shared").await.unwrap(), 0);

        let mut totals = store.usage_by_type(&alice).await.unwrap();
        totals.sort();
        assert_eq!(
            totals,
            vec![(ContentType::Image, 100, 1), (ContentType::Pdf, 200, 2)]
        );
    }
}
