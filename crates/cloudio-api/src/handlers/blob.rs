//! Serves locally stored blobs behind signed URLs.

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};

use cloudio_core::error::AppError;

use crate::dto::request::BlobQuery;
use crate::state::AppState;

/// GET /api/blobs/{*key}?expires=...&signature=...
///
/// No bearer token: the signature issued by the download endpoint is the
/// credential. Only available when the local provider is active.
pub async fn get_blob(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<BlobQuery>,
) -> Result<Response, AppError> {
    let local = state
        .blobs
        .local
        .as_ref()
        .ok_or_else(|| AppError::not_found("Blob not found"))?;

    local.verify(&key, query.expires, &query.signature)?;
    let stream = local.open(&key).await?;

    Ok((
        [
            (CONTENT_TYPE, "application/octet-stream"),
            (CACHE_CONTROL, "private, no-store"),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}
