//! Blob storage configuration.

use serde::{Deserialize, Serialize};

/// Top-level storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Blob provider to use: `"local"` or `"s3"`.
    #[serde(default = "default_provider")]
    pub default_provider: String,
    /// Maximum upload size in bytes (default 10 MB).
    #[serde(default = "default_max_upload")]
    pub max_upload_size_bytes: u64,
    /// Per-user storage quota reported by the usage endpoint (default 10 GB).
    #[serde(default = "default_quota")]
    pub user_quota_bytes: u64,
    /// Lifetime of signed download URLs.
    #[serde(default = "default_signed_ttl")]
    pub signed_url_ttl_seconds: u64,
    /// Prefix under which every uploaded blob key is placed.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Local filesystem blob storage configuration.
    #[serde(default)]
    pub local: LocalStorageConfig,
    /// S3-compatible blob storage configuration.
    #[serde(default)]
    pub s3: S3StorageConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            max_upload_size_bytes: default_max_upload(),
            user_quota_bytes: default_quota(),
            signed_url_ttl_seconds: default_signed_ttl(),
            key_prefix: default_key_prefix(),
            local: LocalStorageConfig::default(),
            s3: S3StorageConfig::default(),
        }
    }
}

/// Local filesystem blob storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalStorageConfig {
    /// Root path for local blob storage.
    #[serde(default = "default_local_root")]
    pub root_path: String,
    /// Secret used to sign download URLs.
    #[serde(default)]
    pub signing_secret: String,
}

impl Default for LocalStorageConfig {
    fn default() -> Self {
        Self {
            root_path: default_local_root(),
            signing_secret: String::new(),
        }
    }
}

/// S3-compatible object storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3StorageConfig {
    /// S3 endpoint URL (for non-AWS services like MinIO).
    #[serde(default)]
    pub endpoint: String,
    /// AWS region.
    #[serde(default = "default_region")]
    pub region: String,
    /// S3 bucket name.
    #[serde(default)]
    pub bucket: String,
    /// Public base URL for objects (used for the cached `url` field).
    #[serde(default)]
    pub public_base_url: String,
}

impl Default for S3StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            region: default_region(),
            bucket: String::new(),
            public_base_url: String::new(),
        }
    }
}

fn default_provider() -> String {
    "local".to_string()
}

fn default_max_upload() -> u64 {
    10_485_760 // 10 MB
}

fn default_quota() -> u64 {
    10_737_418_240 // 10 GB
}

fn default_signed_ttl() -> u64 {
    3600
}

fn default_key_prefix() -> String {
    "cloudio".to_string()
}

fn default_local_root() -> String {
    "./data/blobs".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}
