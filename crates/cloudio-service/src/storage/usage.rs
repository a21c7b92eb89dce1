//! Per-user storage usage against the configured quota.

use std::sync::Arc;

use tokio::try_join;

use cloudio_core::result::AppResult;
use cloudio_database::EntityStore;
use cloudio_entity::StorageUsage;

use crate::context::RequestContext;

/// Summarizes how much storage a user consumes.
#[derive(Debug, Clone)]
pub struct UsageService {
    store: Arc<dyn EntityStore>,
    quota_bytes: u64,
}

impl UsageService {
    /// Creates a usage service reporting against `quota_bytes`.
    pub fn new(store: Arc<dyn EntityStore>, quota_bytes: u64) -> Self {
        Self { store, quota_bytes }
    }

    /// Usage summary for the caller.
    pub async fn usage(&self, ctx: &RequestContext) -> AppResult<StorageUsage> {
        let (by_type, folder_count) = try_join!(
            self.store.usage_by_type(&ctx.owner_id),
            self.store.folder_count(&ctx.owner_id),
        )?;
        Ok(StorageUsage::new(self.quota_bytes, folder_count, by_type))
    }
}
