//! Folder entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use cloudio_core::types::{FolderId, OwnerId};

/// A folder in a user's tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Folder {
    /// Unique folder identifier.
    pub id: FolderId,
    /// Display name, unique among sibling folders.
    pub name: String,
    /// Parent folder ID (None for top-level folders).
    pub parent_id: Option<FolderId>,
    /// The folder owner.
    pub owner_id: OwnerId,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
    /// Last rename or move.
    pub modified_at: DateTime<Utc>,
}

impl Folder {
    /// Build a new, not yet persisted folder stamped with `now`.
    pub fn new(
        owner_id: OwnerId,
        name: impl Into<String>,
        parent_id: Option<FolderId>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: FolderId::new(),
            name: name.into(),
            parent_id,
            owner_id,
            created_at: now,
            modified_at: now,
        }
    }

    /// Check if this folder sits at the top level (no parent).
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}
