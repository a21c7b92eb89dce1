//! The entity store contract shared by the PostgreSQL and in-memory backends.
//!
//! Every call is scoped by [`OwnerId`]; there is no way to address another
//! user's records through this trait. Writes are expressed as a
//! [`ChangeSet`] that the backend applies all-or-nothing, and the backend is
//! the authoritative guard for the tree's structural rules:
//!
//! - a colliding insert or update fails with
//!   [`ErrorKind::Conflict`](cloudio_core::error::ErrorKind);
//! - re-parenting a folder under itself or one of its descendants fails with
//!   `InvalidOperation`, checked against the state the batch commits on;
//! - a [`Mutation::Require`] precondition fails with `NotFound` when the
//!   record is gone, and holds the record until the batch commits.
//!
//! A failed batch leaves nothing committed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use cloudio_core::result::AppResult;
use cloudio_core::types::{FolderId, ItemKind, ItemRef, OwnerId};
use cloudio_entity::{ContentType, Entry, File, Folder};

/// Partial update of a folder or file record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPatch {
    /// New name, if renaming.
    pub name: Option<String>,
    /// New parent, if moving. `Some(None)` moves to the top level.
    pub parent_id: Option<Option<FolderId>>,
    /// New modification timestamp.
    pub modified_at: DateTime<Utc>,
}

impl EntryPatch {
    /// Patch that renames the record.
    pub fn rename(name: impl Into<String>, modified_at: DateTime<Utc>) -> Self {
        Self {
            name: Some(name.into()),
            parent_id: None,
            modified_at,
        }
    }

    /// Patch that re-parents the record.
    pub fn reparent(parent_id: Option<FolderId>, modified_at: DateTime<Utc>) -> Self {
        Self {
            name: None,
            parent_id: Some(parent_id),
            modified_at,
        }
    }
}

/// A single write inside a [`ChangeSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Insert a new folder record.
    InsertFolder(Folder),
    /// Insert a new file record.
    InsertFile(File),
    /// Patch an existing record.
    Update {
        /// The record to patch.
        item: ItemRef,
        /// The changes.
        patch: EntryPatch,
    },
    /// Delete an existing record.
    Delete(ItemRef),
    /// Assert that a record exists and keep it from being deleted until the
    /// batch commits. Writes nothing.
    Require(ItemRef),
}

/// An ordered batch of writes applied atomically.
///
/// Mutations are applied in insertion order, so parents must be inserted
/// before their children and children deleted before their parents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    mutations: Vec<Mutation>,
}

impl ChangeSet {
    /// Create an empty change set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an insert of either kind of record.
    pub fn insert(&mut self, entry: Entry) -> &mut Self {
        self.mutations.push(match entry {
            Entry::Folder(folder) => Mutation::InsertFolder(folder),
            Entry::File(file) => Mutation::InsertFile(file),
        });
        self
    }

    /// Queue a folder insert.
    pub fn insert_folder(&mut self, folder: Folder) -> &mut Self {
        self.mutations.push(Mutation::InsertFolder(folder));
        self
    }

    /// Queue a file insert.
    pub fn insert_file(&mut self, file: File) -> &mut Self {
        self.mutations.push(Mutation::InsertFile(file));
        self
    }

    /// Queue a patch.
    pub fn update(&mut self, item: ItemRef, patch: EntryPatch) -> &mut Self {
        self.mutations.push(Mutation::Update { item, patch });
        self
    }

    /// Queue a delete.
    pub fn delete(&mut self, item: ItemRef) -> &mut Self {
        self.mutations.push(Mutation::Delete(item));
        self
    }

    /// Queue an existence precondition on `item`.
    pub fn require(&mut self, item: ItemRef) -> &mut Self {
        self.mutations.push(Mutation::Require(item));
        self
    }

    /// Whether any mutation moves a folder to a new parent.
    pub fn reparents_folder(&self) -> bool {
        self.mutations.iter().any(|m| {
            matches!(
                m,
                Mutation::Update {
                    item: ItemRef::Folder(_),
                    patch: EntryPatch {
                        parent_id: Some(_),
                        ..
                    },
                }
            )
        })
    }

    /// Number of queued mutations.
    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    /// Iterate over the queued mutations in order.
    pub fn iter(&self) -> impl Iterator<Item = &Mutation> {
        self.mutations.iter()
    }

    /// Consume the set, yielding its mutations in order.
    pub fn into_mutations(self) -> Vec<Mutation> {
        self.mutations
    }
}

/// Result of a name search.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct SearchHits {
    /// Matching folders, name-ordered.
    pub folders: Vec<Folder>,
    /// Matching files, name-ordered.
    pub files: Vec<File>,
}

/// Per-category totals: `(category, total bytes, file count)`.
pub type TypeTotals = Vec<(ContentType, u64, u64)>;

/// Persistent, owner-scoped storage for folder and file records.
#[async_trait]
pub trait EntityStore: Send + Sync + std::fmt::Debug + 'static {
    /// Backend name for logs (e.g. "postgres", "memory").
    fn backend(&self) -> &str;

    /// Check whether the backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Fetch one record owned by `owner`.
    async fn get(&self, item: ItemRef, owner: &OwnerId) -> AppResult<Option<Entry>>;

    /// List the direct children of `parent` (None = top level) of one kind,
    /// ordered by name bytewise (the `C` collation), so every backend lists
    /// in the same order.
    async fn list_children(
        &self,
        parent: Option<FolderId>,
        owner: &OwnerId,
        kind: ItemKind,
    ) -> AppResult<Vec<Entry>>;

    /// Exact, case-sensitive lookup of a child by name.
    async fn find_child_by_name(
        &self,
        parent: Option<FolderId>,
        owner: &OwnerId,
        kind: ItemKind,
        name: &str,
    ) -> AppResult<Option<Entry>> {
        Ok(self
            .list_children(parent, owner, kind)
            .await?
            .into_iter()
            .find(|entry| entry.name() == name))
    }

    /// Apply every mutation in `changes` atomically on behalf of `owner`.
    ///
    /// Fails with `Conflict` on a sibling-name collision, `InvalidOperation`
    /// when a folder would become its own ancestor, `NotFound` when a
    /// patched, deleted or required record (or an inserted record's parent)
    /// does not exist for `owner`, and `DependencyFailure` when the backend
    /// fails.
    /// On any failure no mutation in the set is visible.
    async fn apply(&self, owner: &OwnerId, changes: ChangeSet) -> AppResult<()>;

    /// Insert a single record.
    async fn insert(&self, owner: &OwnerId, entry: Entry) -> AppResult<()> {
        let mut changes = ChangeSet::new();
        changes.insert(entry);
        self.apply(owner, changes).await
    }

    /// Patch a single record.
    async fn update(&self, owner: &OwnerId, item: ItemRef, patch: EntryPatch) -> AppResult<()> {
        let mut changes = ChangeSet::new();
        changes.update(item, patch);
        self.apply(owner, changes).await
    }

    /// Delete a single record.
    async fn delete(&self, owner: &OwnerId, item: ItemRef) -> AppResult<()> {
        let mut changes = ChangeSet::new();
        changes.delete(item);
        self.apply(owner, changes).await
    }

    /// Case-insensitive substring search over folder and file names.
    async fn search(
        &self,
        owner: &OwnerId,
        query: &str,
        folder_limit: usize,
        file_limit: usize,
    ) -> AppResult<SearchHits>;

    /// Total size and count of the owner's files per content category.
    async fn usage_by_type(&self, owner: &OwnerId) -> AppResult<TypeTotals>;

    /// Number of folders the owner has.
    async fn folder_count(&self, owner: &OwnerId) -> AppResult<u64>;

    /// Number of the owner's file records that reference `blob_key`.
    async fn blob_reference_count(&self, owner: &OwnerId, blob_key: &str) -> AppResult<u64>;
}
