//! # cloudio-storage
//!
//! Blob store implementations for Cloudio: a local filesystem store that
//! serves its own signed download URLs, and an optional S3-compatible store
//! (behind the `s3` feature) that uses presigned object URLs.

pub mod factory;
pub mod providers;
pub mod signing;

pub use factory::{BlobBackend, build_blob_store};
pub use providers::LocalBlobStore;
