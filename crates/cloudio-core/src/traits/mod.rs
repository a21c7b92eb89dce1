//! Core traits defined in `cloudio-core` and implemented by other crates.

pub mod blob;

pub use blob::{BlobStore, StoredBlob};
