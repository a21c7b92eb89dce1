//! Route handlers, grouped by resource.

pub mod blob;
pub mod file;
pub mod folder;
pub mod health;
pub mod search;
pub mod storage;

use cloudio_core::error::AppError;
use cloudio_entity::{Entry, File, Folder};

/// Unwrap an entry the service returned for a folder reference.
pub(crate) fn into_folder(entry: Entry) -> Result<Folder, AppError> {
    entry
        .into_folder()
        .ok_or_else(|| AppError::internal("Expected a folder record"))
}

/// Unwrap an entry the service returned for a file reference.
pub(crate) fn into_file(entry: Entry) -> Result<File, AppError> {
    entry
        .into_file()
        .ok_or_else(|| AppError::internal("Expected a file record"))
}
