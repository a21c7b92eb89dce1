//! Tagged references to filesystem items.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::id::{FileId, FolderId};

/// The two kinds of item in a user's tree.
///
/// Folder and file name spaces are independent: a file and a folder may
/// share a name under the same parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// A file record backed by a blob.
    File,
    /// A folder record.
    Folder,
}

impl ItemKind {
    /// Lowercase label used in log fields and messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Folder => "folder",
        }
    }

    /// Capitalized label for user-facing messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::File => "File",
            Self::Folder => "Folder",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "folder" => Ok(Self::Folder),
            other => Err(format!("Unknown item kind: {other}")),
        }
    }
}

/// An item id carried together with its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum ItemRef {
    /// Reference to a file.
    File(FileId),
    /// Reference to a folder.
    Folder(FolderId),
}

impl ItemRef {
    /// The kind of the referenced item.
    pub fn kind(&self) -> ItemKind {
        match self {
            Self::File(_) => ItemKind::File,
            Self::Folder(_) => ItemKind::Folder,
        }
    }

    /// The raw UUID of the referenced item.
    pub fn uuid(&self) -> uuid::Uuid {
        match self {
            Self::File(id) => id.0,
            Self::Folder(id) => id.0,
        }
    }
}

impl From<FileId> for ItemRef {
    fn from(id: FileId) -> Self {
        Self::File(id)
    }
}

impl From<FolderId> for ItemRef {
    fn from(id: FolderId) -> Self {
        Self::Folder(id)
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.uuid())
    }
}
