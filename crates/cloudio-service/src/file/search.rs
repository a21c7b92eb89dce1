//! Name search across a user's folders and files.

use std::sync::Arc;

use cloudio_core::error::AppError;
use cloudio_core::result::AppResult;
use cloudio_database::{EntityStore, SearchHits};

use crate::context::RequestContext;

/// Shortest accepted query, in characters after trimming.
pub const MIN_QUERY_LENGTH: usize = 2;
/// Folder hits returned per search.
pub const FOLDER_RESULT_LIMIT: usize = 20;
/// File hits returned per search.
pub const FILE_RESULT_LIMIT: usize = 30;

/// Case-insensitive substring search over item names.
#[derive(Debug, Clone)]
pub struct SearchService {
    store: Arc<dyn EntityStore>,
}

impl SearchService {
    /// Creates a new search service.
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Searches the caller's items whose name contains `query`.
    pub async fn search(&self, ctx: &RequestContext, query: &str) -> AppResult<SearchHits> {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_LENGTH {
            return Err(AppError::validation(format!(
                "Search query must be at least {MIN_QUERY_LENGTH} characters"
            )));
        }

        self.store
            .search(&ctx.owner_id, query, FOLDER_RESULT_LIMIT, FILE_RESULT_LIMIT)
            .await
    }
}
