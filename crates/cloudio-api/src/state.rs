//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use cloudio_auth::JwtDecoder;
use cloudio_core::config::AppConfig;
use cloudio_database::EntityStore;
use cloudio_service::{DownloadService, ItemService, SearchService, UploadService, UsageService};
use cloudio_storage::BlobBackend;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,

    // ── Infrastructure ───────────────────────────────────────
    /// Entity store (PostgreSQL or in-memory)
    pub store: Arc<dyn EntityStore>,
    /// Blob store, plus the local store when blobs are served by this API
    pub blobs: BlobBackend,

    // ── Auth ─────────────────────────────────────────────────
    /// Bearer token decoder
    pub jwt_decoder: Arc<JwtDecoder>,

    // ── Services ─────────────────────────────────────────────
    /// Create, rename, move, copy, and delete
    pub item_service: Arc<ItemService>,
    /// File uploads
    pub upload_service: Arc<UploadService>,
    /// Signed download links
    pub download_service: Arc<DownloadService>,
    /// Name search
    pub search_service: Arc<SearchService>,
    /// Storage usage
    pub usage_service: Arc<UsageService>,
}

impl AppState {
    /// Wire every service over the given store and blob backend.
    pub fn new(
        config: AppConfig,
        store: Arc<dyn EntityStore>,
        blobs: BlobBackend,
        jwt_decoder: JwtDecoder,
    ) -> Self {
        let limits = config.limits.clone();
        let storage = &config.storage;

        let item_service = Arc::new(ItemService::new(
            Arc::clone(&store),
            Arc::clone(&blobs.store),
            limits.clone(),
        ));
        let upload_service = Arc::new(UploadService::new(
            Arc::clone(&store),
            Arc::clone(&blobs.store),
            storage,
            limits,
        ));
        let download_service = Arc::new(DownloadService::new(
            Arc::clone(&store),
            Arc::clone(&blobs.store),
            storage.signed_url_ttl_seconds,
        ));
        let search_service = Arc::new(SearchService::new(Arc::clone(&store)));
        let usage_service = Arc::new(UsageService::new(
            Arc::clone(&store),
            storage.user_quota_bytes,
        ));

        Self {
            config: Arc::new(config),
            store,
            blobs,
            jwt_decoder: Arc::new(jwt_decoder),
            item_service,
            upload_service,
            download_service,
            search_service,
            usage_service,
        }
    }
}
