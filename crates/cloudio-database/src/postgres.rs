//! PostgreSQL-backed entity store.

use async_trait::async_trait;
use tracing::{debug, warn};

use cloudio_core::result::AppResult;
use cloudio_core::types::{FolderId, ItemKind, ItemRef, OwnerId};
use cloudio_entity::Entry;

use crate::connection::DatabasePool;
use crate::repositories::{FileRepository, FolderRepository, db_error};
use crate::store::{ChangeSet, EntityStore, Mutation, SearchHits, TypeTotals};

/// Entity store backed by the `folders` and `files` tables.
///
/// Each [`ChangeSet`] runs in one transaction; the unique sibling-name
/// indexes make concurrent colliding writes fail with a conflict. Batches
/// that move folders first take a per-owner advisory lock, so the ancestry
/// check inside the transaction sees every move committed before it.
#[derive(Debug, Clone)]
pub struct PgEntityStore {
    db: DatabasePool,
    folders: FolderRepository,
    files: FileRepository,
}

impl PgEntityStore {
    /// Create a store over an open pool.
    pub fn new(db: DatabasePool) -> Self {
        let pool = db.pool().clone();
        Self {
            db,
            folders: FolderRepository::new(pool.clone()),
            files: FileRepository::new(pool),
        }
    }
}

#[async_trait]
impl EntityStore for PgEntityStore {
    fn backend(&self) -> &str {
        "postgres"
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.folders.ping().await
    }

    async fn get(&self, item: ItemRef, owner: &OwnerId) -> AppResult<Option<Entry>> {
        Ok(match item {
            ItemRef::Folder(id) => self.folders.find_by_id(id, owner).await?.map(Entry::Folder),
            ItemRef::File(id) => self.files.find_by_id(id, owner).await?.map(Entry::File),
        })
    }

    async fn list_children(
        &self,
        parent: Option<FolderId>,
        owner: &OwnerId,
        kind: ItemKind,
    ) -> AppResult<Vec<Entry>> {
        Ok(match kind {
            ItemKind::Folder => self
                .folders
                .find_children(parent, owner)
                .await?
                .into_iter()
                .map(Entry::Folder)
                .collect(),
            ItemKind::File => self
                .files
                .find_children(parent, owner)
                .await?
                .into_iter()
                .map(Entry::File)
                .collect(),
        })
    }

    async fn find_child_by_name(
        &self,
        parent: Option<FolderId>,
        owner: &OwnerId,
        kind: ItemKind,
        name: &str,
    ) -> AppResult<Option<Entry>> {
        Ok(match kind {
            ItemKind::Folder => self
                .folders
                .find_by_name(parent, owner, name)
                .await?
                .map(Entry::Folder),
            ItemKind::File => self
                .files
                .find_by_name(parent, owner, name)
                .await?
                .map(Entry::File),
        })
    }

    async fn apply(&self, owner: &OwnerId, changes: ChangeSet) -> AppResult<()> {
        let count = changes.len();
        let mut tx = self
            .db
            .pool()
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;

        if changes.reparents_folder() {
            if let Err(e) = FolderRepository::lock_tree(&mut tx, owner).await {
                if let Err(rollback) = tx.rollback().await {
                    warn!(error = %rollback, "Transaction rollback failed");
                }
                return Err(e);
            }
        }

        for mutation in changes.into_mutations() {
            let result = match &mutation {
                Mutation::InsertFolder(folder) => FolderRepository::insert(&mut tx, folder).await,
                Mutation::InsertFile(file) => FileRepository::insert(&mut tx, file).await,
                Mutation::Update {
                    item: ItemRef::Folder(id),
                    patch,
                } => FolderRepository::update(&mut tx, *id, owner, patch).await,
                Mutation::Update {
                    item: ItemRef::File(id),
                    patch,
                } => FileRepository::update(&mut tx, *id, owner, patch).await,
                Mutation::Delete(ItemRef::Folder(id)) => {
                    FolderRepository::delete(&mut tx, *id, owner).await
                }
                Mutation::Delete(ItemRef::File(id)) => {
                    FileRepository::delete(&mut tx, *id, owner).await
                }
                Mutation::Require(ItemRef::Folder(id)) => {
                    FolderRepository::require(&mut tx, *id, owner).await
                }
                Mutation::Require(ItemRef::File(id)) => {
                    FileRepository::require(&mut tx, *id, owner).await
                }
            };

            if let Err(e) = result {
                if let Err(rollback) = tx.rollback().await {
                    warn!(error = %rollback, "Transaction rollback failed");
                }
                return Err(e);
            }
        }

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit transaction", e))?;
        debug!(owner = %owner, mutations = count, "Committed change set");
        Ok(())
    }

    async fn search(
        &self,
        owner: &OwnerId,
        query: &str,
        folder_limit: usize,
        file_limit: usize,
    ) -> AppResult<SearchHits> {
        let (folders, files) = tokio::try_join!(
            self.folders.search(owner, query, folder_limit),
            self.files.search(owner, query, file_limit),
        )?;
        Ok(SearchHits { folders, files })
    }

    async fn usage_by_type(&self, owner: &OwnerId) -> AppResult<TypeTotals> {
        self.files.usage_by_type(owner).await
    }

    async fn folder_count(&self, owner: &OwnerId) -> AppResult<u64> {
        self.folders.count(owner).await
    }

    async fn blob_reference_count(&self, owner: &OwnerId, blob_key: &str) -> AppResult<u64> {
        self.files.count_by_blob_key(owner, blob_key).await
    }
}
