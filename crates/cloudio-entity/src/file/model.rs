//! File entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use cloudio_core::types::{FileId, FolderId, OwnerId};

use super::content_type::ContentType;

/// File metadata. The bytes live in the blob store under `blob_key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct File {
    /// Unique file identifier.
    pub id: FileId,
    /// The file name (including extension), unique among sibling files.
    pub name: String,
    /// Size in bytes.
    #[sqlx(try_from = "i64")]
    pub size: u64,
    /// Broad content category, derived from the extension at upload time.
    pub content_type: ContentType,
    /// Opaque blob store handle. Copies share the key of their source.
    pub blob_key: String,
    /// Cached access URL; may be stale or expired.
    pub url: String,
    /// Containing folder (None for top-level files).
    pub parent_id: Option<FolderId>,
    /// The file owner.
    pub owner_id: OwnerId,
    /// When the file was created.
    pub created_at: DateTime<Utc>,
    /// Last rename or move.
    pub modified_at: DateTime<Utc>,
}

impl File {
    /// Get the file extension (lowercase), if any.
    pub fn extension(&self) -> Option<String> {
        self.name
            .rsplit('.')
            .next()
            .filter(|ext| *ext != self.name)
            .map(|ext| ext.to_lowercase())
    }
}
