//! Response DTOs.

use serde::{Deserialize, Serialize};

use cloudio_entity::{Entry, File, Folder};

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Plain confirmation message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// What happened.
    pub message: String,
}

impl MessageResponse {
    /// Creates a message response.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Health report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `"ok"` when every dependency is reachable, `"degraded"` otherwise.
    pub status: String,
    /// Server version.
    pub version: String,
    /// Entity store backend and reachability.
    pub store: ComponentHealth,
    /// Blob provider and reachability.
    pub blobs: ComponentHealth,
}

/// Health of one dependency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// Backend or provider name.
    pub backend: String,
    /// Whether the last check succeeded.
    pub healthy: bool,
}

/// Collect folder entries from a listing.
pub fn folders(entries: Vec<Entry>) -> Vec<Folder> {
    entries.into_iter().filter_map(Entry::into_folder).collect()
}

/// Collect file entries from a listing.
pub fn files(entries: Vec<Entry>) -> Vec<File> {
    entries.into_iter().filter_map(Entry::into_file).collect()
}
