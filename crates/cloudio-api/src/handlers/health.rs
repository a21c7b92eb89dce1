//! Health check handler.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::warn;

use crate::dto::response::{ApiResponse, ComponentHealth, HealthResponse};
use crate::state::AppState;

/// GET /api/health
pub async fn health(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<HealthResponse>>) {
    let store_ok = state.store.health_check().await.unwrap_or_else(|e| {
        warn!(error = %e, "Entity store health check failed");
        false
    });
    let blobs_ok = state.blobs.store.health_check().await.unwrap_or_else(|e| {
        warn!(error = %e, "Blob store health check failed");
        false
    });

    let healthy = store_ok && blobs_ok;
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ApiResponse::ok(HealthResponse {
            status: if healthy { "ok" } else { "degraded" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            store: ComponentHealth {
                backend: state.store.backend().to_string(),
                healthy: store_ok,
            },
            blobs: ComponentHealth {
                backend: state.blobs.store.provider_type().to_string(),
                healthy: blobs_ok,
            },
        })),
    )
}
