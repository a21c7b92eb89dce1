//! Storage usage handler.

use axum::Json;
use axum::extract::State;

use cloudio_core::error::AppError;
use cloudio_entity::StorageUsage;

use crate::dto::response::ApiResponse;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/storage
pub async fn get_usage(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<StorageUsage>>, AppError> {
    let usage = state.usage_service.usage(&auth).await?;
    Ok(Json(ApiResponse::ok(usage)))
}
