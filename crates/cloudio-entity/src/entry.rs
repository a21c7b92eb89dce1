//! A folder or file record behind a single tagged type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cloudio_core::types::{FolderId, ItemKind, ItemRef, OwnerId};

use crate::file::File;
use crate::folder::Folder;

/// Either kind of record, discriminated explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "item_type", rename_all = "lowercase")]
pub enum Entry {
    /// A folder record.
    Folder(Folder),
    /// A file record.
    File(File),
}

impl Entry {
    /// The record's kind.
    pub fn kind(&self) -> ItemKind {
        match self {
            Self::Folder(_) => ItemKind::Folder,
            Self::File(_) => ItemKind::File,
        }
    }

    /// Tagged id of the record.
    pub fn item_ref(&self) -> ItemRef {
        match self {
            Self::Folder(f) => ItemRef::Folder(f.id),
            Self::File(f) => ItemRef::File(f.id),
        }
    }

    /// Display name.
    pub fn name(&self) -> &str {
        match self {
            Self::Folder(f) => &f.name,
            Self::File(f) => &f.name,
        }
    }

    /// Parent folder, if any.
    pub fn parent_id(&self) -> Option<FolderId> {
        match self {
            Self::Folder(f) => f.parent_id,
            Self::File(f) => f.parent_id,
        }
    }

    /// Owner of the record.
    pub fn owner_id(&self) -> &OwnerId {
        match self {
            Self::Folder(f) => &f.owner_id,
            Self::File(f) => &f.owner_id,
        }
    }

    /// Last rename or move.
    pub fn modified_at(&self) -> DateTime<Utc> {
        match self {
            Self::Folder(f) => f.modified_at,
            Self::File(f) => f.modified_at,
        }
    }

    /// Unwrap a folder record.
    pub fn into_folder(self) -> Option<Folder> {
        match self {
            Self::Folder(f) => Some(f),
            Self::File(_) => None,
        }
    }

    /// Unwrap a file record.
    pub fn into_file(self) -> Option<File> {
        match self {
            Self::File(f) => Some(f),
            Self::Folder(_) => None,
        }
    }
}

impl From<Folder> for Entry {
    fn from(folder: Folder) -> Self {
        Self::Folder(folder)
    }
}

impl From<File> for Entry {
    fn from(file: File) -> Self {
        Self::File(file)
    }
}
