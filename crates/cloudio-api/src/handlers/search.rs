//! Search handler.

use axum::Json;
use axum::extract::{Query, State};

use cloudio_core::error::AppError;
use cloudio_database::SearchHits;

use crate::dto::request::{SearchQuery, validated};
use crate::dto::response::ApiResponse;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/search?query=...
pub async fn search(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<SearchHits>>, AppError> {
    let query = validated(query)?;
    let hits = state.search_service.search(&auth, &query.query).await?;
    Ok(Json(ApiResponse::ok(hits)))
}
