//! File services: upload, signed download, and search.

pub mod download;
pub mod search;
pub mod upload;

pub use download::{DownloadLink, DownloadService};
pub use search::SearchService;
pub use upload::UploadService;
