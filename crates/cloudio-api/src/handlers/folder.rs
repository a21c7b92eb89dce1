//! Folder handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use cloudio_core::error::AppError;
use cloudio_core::types::{FolderId, ItemKind, ItemRef};
use cloudio_entity::Folder;

use super::into_folder;
use crate::dto::request::{CreateFolderRequest, FolderListQuery, RenameRequest, TargetRequest};
use crate::dto::response::{self, ApiResponse, MessageResponse};
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/folders?parent_id=...
pub async fn list_folders(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<FolderListQuery>,
) -> Result<Json<ApiResponse<Vec<Folder>>>, AppError> {
    let entries = state
        .item_service
        .list_children(&auth, query.parent_id, ItemKind::Folder)
        .await?;
    Ok(Json(ApiResponse::ok(response::folders(entries))))
}

/// POST /api/folders
pub async fn create_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateFolderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Folder>>), AppError> {
    let folder = state
        .item_service
        .create_folder(&auth, &req.name, req.parent_id)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(folder))))
}

/// GET /api/folders/{id}
pub async fn get_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<FolderId>,
) -> Result<Json<ApiResponse<Folder>>, AppError> {
    let entry = state.item_service.get(&auth, ItemRef::Folder(id)).await?;
    Ok(Json(ApiResponse::ok(into_folder(entry)?)))
}

/// PATCH /api/folders/{id}
pub async fn rename_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<FolderId>,
    Json(req): Json<RenameRequest>,
) -> Result<Json<ApiResponse<Folder>>, AppError> {
    let entry = state
        .item_service
        .rename(&auth, ItemRef::Folder(id), &req.name)
        .await?;
    Ok(Json(ApiResponse::ok(into_folder(entry)?)))
}

/// DELETE /api/folders/{id}
pub async fn delete_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<FolderId>,
) -> Result<Json<ApiResponse<MessageResponse>>, AppError> {
    state
        .item_service
        .delete_item(&auth, ItemRef::Folder(id))
        .await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("Folder deleted"))))
}

/// POST /api/folders/{id}/move
pub async fn move_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<FolderId>,
    Json(req): Json<TargetRequest>,
) -> Result<Json<ApiResponse<Folder>>, AppError> {
    let entry = state
        .item_service
        .move_item(&auth, ItemRef::Folder(id), req.target_folder_id)
        .await?;
    Ok(Json(ApiResponse::ok(into_folder(entry)?)))
}

/// POST /api/folders/{id}/copy
pub async fn copy_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<FolderId>,
    Json(req): Json<TargetRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Folder>>), AppError> {
    let entry = state
        .item_service
        .copy_item(&auth, ItemRef::Folder(id), req.target_folder_id)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(into_folder(entry)?))))
}

/// GET /api/folders/{id}/breadcrumbs
pub async fn breadcrumbs(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<FolderId>,
) -> Result<Json<ApiResponse<Vec<Folder>>>, AppError> {
    let chain = state.item_service.breadcrumbs(&auth, id).await?;
    Ok(Json(ApiResponse::ok(chain)))
}
