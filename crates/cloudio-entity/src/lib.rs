//! # cloudio-entity
//!
//! Domain records for Cloudio. Every struct in this crate is either a
//! database table row or a value object derived from rows. Table rows
//! derive `sqlx::FromRow`; parent links are plain ids, never embedded
//! objects.

pub mod entry;
pub mod file;
pub mod folder;
pub mod storage;

pub use entry::Entry;
pub use file::{ContentType, File};
pub use folder::Folder;
pub use storage::{StorageUsage, TypeUsage};
