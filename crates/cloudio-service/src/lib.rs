//! # cloudio-service
//!
//! The hierarchical filesystem core for Cloudio: the naming policy, the tree
//! integrity engine, and the mutation orchestrator that turns each
//! user-facing operation into one atomic change against the entity store.
//! Upload, download, search, and usage services sit alongside.
//!
//! Services are stateless and take their collaborators as `Arc` trait
//! objects at construction time.

pub mod context;
pub mod file;
pub mod item;
pub mod naming;
pub mod storage;
pub mod tree;

#[cfg(test)]
pub(crate) mod testing;

pub use context::RequestContext;
pub use file::{DownloadLink, DownloadService, SearchService, UploadService};
pub use item::ItemService;
pub use naming::{NameViolation, generate_copy_name, validate_name};
pub use storage::UsageService;
pub use tree::TreeIntegrity;
