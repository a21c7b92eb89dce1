//! Request DTOs.

use serde::{Deserialize, Serialize};
use validator::Validate;

use cloudio_core::error::AppError;
use cloudio_core::types::FolderId;

/// Create folder request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFolderRequest {
    /// Folder name.
    pub name: String,
    /// Parent folder; omitted or null for the top level.
    #[serde(default, alias = "parentId")]
    pub parent_id: Option<FolderId>,
}

/// Rename request for files and folders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameRequest {
    /// New name.
    pub name: String,
}

/// Move or copy request. A null target means the top level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetRequest {
    /// Destination folder.
    #[serde(default, alias = "targetFolderId")]
    pub target_folder_id: Option<FolderId>,
}

/// Query string for folder listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FolderListQuery {
    /// Parent to list; omitted for the top level.
    #[serde(default, alias = "parentId")]
    pub parent_id: Option<FolderId>,
}

/// Query string for file listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileListQuery {
    /// Folder to list; omitted for the top level.
    #[serde(default, alias = "folderId")]
    pub folder_id: Option<FolderId>,
}

/// Query string for search.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SearchQuery {
    /// Text to look for in item names.
    #[serde(default)]
    #[validate(length(max = 255, message = "Search query is too long"))]
    pub query: String,
}

/// Query string carried by signed blob URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobQuery {
    /// Unix time after which the link is rejected.
    pub expires: i64,
    /// Hex signature over key and expiry.
    pub signature: String,
}

/// Run `validator` checks, reporting failures as `Validation` errors.
pub fn validated<T: Validate>(value: T) -> Result<T, AppError> {
    value
        .validate()
        .map_err(|e| AppError::validation(format!("Invalid request: {e}")))?;
    Ok(value)
}
