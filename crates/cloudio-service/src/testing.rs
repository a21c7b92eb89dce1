//! Shared fixtures for service tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use tokio::sync::Mutex;

use cloudio_core::config::LimitsConfig;
use cloudio_core::error::AppError;
use cloudio_core::result::AppResult;
use cloudio_core::traits::{BlobStore, StoredBlob};
use cloudio_core::types::{FileId, FolderId, ItemKind, ItemRef, OwnerId};
use cloudio_database::{
    ChangeSet, EntityStore, MemoryEntityStore, SearchHits, TypeTotals,
};
use cloudio_entity::{ContentType, Entry, File, Folder};

use crate::context::RequestContext;

pub fn owner(name: &str) -> OwnerId {
    OwnerId::new(name).expect("owner")
}

pub fn ctx(name: &str) -> RequestContext {
    RequestContext::new(owner(name))
}

pub fn limits() -> LimitsConfig {
    LimitsConfig::default()
}

/// Insert a folder directly through the store.
pub async fn seed_folder(
    store: &dyn EntityStore,
    owner: &OwnerId,
    name: &str,
    parent: Option<FolderId>,
) -> Folder {
    let folder = Folder::new(owner.clone(), name, parent, Utc::now());
    store
        .insert(owner, Entry::Folder(folder.clone()))
        .await
        .expect("seed folder");
    folder
}

/// Insert a file directly through the store.
pub async fn seed_file(
    store: &dyn EntityStore,
    owner: &OwnerId,
    name: &str,
    parent: Option<FolderId>,
    blob_key: &str,
) -> File {
    let now = Utc::now();
    let file = File {
        id: FileId::new(),
        name: name.to_string(),
        size: 1024,
        content_type: ContentType::from_file_name(name),
        blob_key: blob_key.to_string(),
        url: format!("http://blobs.test/{blob_key}"),
        parent_id: parent,
        owner_id: owner.clone(),
        created_at: now,
        modified_at: now,
    };
    store
        .insert(owner, Entry::File(file.clone()))
        .await
        .expect("seed file");
    file
}

/// Blob store that keeps blobs in memory and records deletions.
#[derive(Debug, Default)]
pub struct FakeBlobStore {
    pub blobs: Mutex<Vec<String>>,
    pub deleted: Mutex<Vec<String>>,
    pub fail_deletes: AtomicBool,
    counter: AtomicUsize,
}

impl FakeBlobStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn deleted_keys(&self) -> Vec<String> {
        self.deleted.lock().await.clone()
    }

    pub async fn stored_keys(&self) -> Vec<String> {
        self.blobs.lock().await.clone()
    }
}

#[async_trait]
impl BlobStore for FakeBlobStore {
    fn provider_type(&self) -> &str {
        "fake"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn upload(&self, _data: Bytes, destination_hint: &str) -> AppResult<StoredBlob> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let key = format!("{destination_hint}/blob-{n}");
        self.blobs.lock().await.push(key.clone());
        Ok(StoredBlob {
            url: format!("http://blobs.test/{key}"),
            key,
        })
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(AppError::dependency("blob store unavailable"));
        }
        self.blobs.lock().await.retain(|k| k != key);
        self.deleted.lock().await.push(key.to_string());
        Ok(())
    }

    async fn sign(&self, key: &str, ttl_seconds: u64) -> AppResult<String> {
        Ok(format!("http://blobs.test/{key}?ttl={ttl_seconds}"))
    }
}

/// Entity store wrapper whose writes can be made to fail.
#[derive(Debug, Default)]
pub struct FlakyStore {
    pub inner: MemoryEntityStore,
    pub fail_apply: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl EntityStore for FlakyStore {
    fn backend(&self) -> &str {
        "flaky"
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }

    async fn get(&self, item: ItemRef, owner: &OwnerId) -> AppResult<Option<Entry>> {
        self.inner.get(item, owner).await
    }

    async fn list_children(
        &self,
        parent: Option<FolderId>,
        owner: &OwnerId,
        kind: ItemKind,
    ) -> AppResult<Vec<Entry>> {
        self.inner.list_children(parent, owner, kind).await
    }

    async fn apply(&self, owner: &OwnerId, changes: ChangeSet) -> AppResult<()> {
        if self.fail_apply.load(Ordering::SeqCst) {
            return Err(AppError::dependency("entity store unavailable"));
        }
        self.inner.apply(owner, changes).await
    }

    async fn search(
        &self,
        owner: &OwnerId,
        query: &str,
        folder_limit: usize,
        file_limit: usize,
    ) -> AppResult<SearchHits> {
        self.inner.search(owner, query, folder_limit, file_limit).await
    }

    async fn usage_by_type(&self, owner: &OwnerId) -> AppResult<TypeTotals> {
        self.inner.usage_by_type(owner).await
    }

    async fn folder_count(&self, owner: &OwnerId) -> AppResult<u64> {
        self.inner.folder_count(owner).await
    }

    async fn blob_reference_count(&self, owner: &OwnerId, blob_key: &str) -> AppResult<u64> {
        self.inner.blob_reference_count(owner, blob_key).await
    }
}

/// Entity store wrapper that yields to the scheduler after every read, so
/// two operations joined on one task interleave between their checks and
/// their writes.
#[derive(Debug, Default)]
pub struct YieldingStore {
    pub inner: MemoryEntityStore,
}

impl YieldingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl EntityStore for YieldingStore {
    fn backend(&self) -> &str {
        "yielding"
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }

    async fn get(&self, item: ItemRef, owner: &OwnerId) -> AppResult<Option<Entry>> {
        let entry = self.inner.get(item, owner).await;
        tokio::task::yield_now().await;
        entry
    }

    async fn list_children(
        &self,
        parent: Option<FolderId>,
        owner: &OwnerId,
        kind: ItemKind,
    ) -> AppResult<Vec<Entry>> {
        let children = self.inner.list_children(parent, owner, kind).await;
        tokio::task::yield_now().await;
        children
    }

    async fn apply(&self, owner: &OwnerId, changes: ChangeSet) -> AppResult<()> {
        self.inner.apply(owner, changes).await
    }

    async fn search(
        &self,
        owner: &OwnerId,
        query: &str,
        folder_limit: usize,
        file_limit: usize,
    ) -> AppResult<SearchHits> {
        self.inner.search(owner, query, folder_limit, file_limit).await
    }

    async fn usage_by_type(&self, owner: &OwnerId) -> AppResult<TypeTotals> {
        self.inner.usage_by_type(owner).await
    }

    async fn folder_count(&self, owner: &OwnerId) -> AppResult<u64> {
        self.inner.folder_count(owner).await
    }

    async fn blob_reference_count(&self, owner: &OwnerId, blob_key: &str) -> AppResult<u64> {
        let count = self.inner.blob_reference_count(owner, blob_key).await;
        tokio::task::yield_now().await;
        count
    }
}
