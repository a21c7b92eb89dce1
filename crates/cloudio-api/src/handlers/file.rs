//! File handlers, including multipart upload and signed downloads.

use axum::Json;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use bytes::Bytes;

use cloudio_core::error::AppError;
use cloudio_core::types::{FileId, FolderId, ItemKind, ItemRef};
use cloudio_entity::File;
use cloudio_service::DownloadLink;

use super::into_file;
use crate::dto::request::{FileListQuery, RenameRequest, TargetRequest};
use crate::dto::response::{self, ApiResponse, MessageResponse};
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/files?folder_id=...
pub async fn list_files(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<FileListQuery>,
) -> Result<Json<ApiResponse<Vec<File>>>, AppError> {
    let entries = state
        .item_service
        .list_children(&auth, query.folder_id, ItemKind::File)
        .await?;
    Ok(Json(ApiResponse::ok(response::files(entries))))
}

/// POST /api/files (multipart: `file`, optional `folder_id`)
pub async fn upload_file(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<File>>), AppError> {
    let mut upload: Option<(String, Bytes)> = None;
    let mut folder_id: Option<FolderId> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Malformed multipart body: {e}")))?
    {
        match field.name() {
            Some("file") => {
                let name = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| AppError::validation("The file field has no file name"))?;
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::validation(format!("Failed to read upload: {e}")))?;
                upload = Some((name, data));
            }
            Some("folder_id") | Some("folderId") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::validation(format!("Failed to read folder_id: {e}")))?;
                folder_id = parse_folder_field(&text)?;
            }
            _ => {}
        }
    }

    let (name, data) = upload.ok_or_else(|| AppError::validation("No file provided"))?;
    let file = state
        .upload_service
        .upload(&auth, &name, data, folder_id)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(file))))
}

/// GET /api/files/{id}
pub async fn get_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<FileId>,
) -> Result<Json<ApiResponse<File>>, AppError> {
    let entry = state.item_service.get(&auth, ItemRef::File(id)).await?;
    Ok(Json(ApiResponse::ok(into_file(entry)?)))
}

/// PATCH /api/files/{id}
pub async fn rename_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<FileId>,
    Json(req): Json<RenameRequest>,
) -> Result<Json<ApiResponse<File>>, AppError> {
    let entry = state
        .item_service
        .rename(&auth, ItemRef::File(id), &req.name)
        .await?;
    Ok(Json(ApiResponse::ok(into_file(entry)?)))
}

/// DELETE /api/files/{id}
pub async fn delete_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<FileId>,
) -> Result<Json<ApiResponse<MessageResponse>>, AppError> {
    state
        .item_service
        .delete_item(&auth, ItemRef::File(id))
        .await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("File deleted"))))
}

/// POST /api/files/{id}/move
pub async fn move_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<FileId>,
    Json(req): Json<TargetRequest>,
) -> Result<Json<ApiResponse<File>>, AppError> {
    let entry = state
        .item_service
        .move_item(&auth, ItemRef::File(id), req.target_folder_id)
        .await?;
    Ok(Json(ApiResponse::ok(into_file(entry)?)))
}

/// POST /api/files/{id}/copy
pub async fn copy_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<FileId>,
    Json(req): Json<TargetRequest>,
) -> Result<(StatusCode, Json<ApiResponse<File>>), AppError> {
    let entry = state
        .item_service
        .copy_item(&auth, ItemRef::File(id), req.target_folder_id)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(into_file(entry)?))))
}

/// GET /api/files/{id}/download
pub async fn download_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<FileId>,
) -> Result<Json<ApiResponse<DownloadLink>>, AppError> {
    let link = state.download_service.download_url(&auth, id).await?;
    Ok(Json(ApiResponse::ok(link)))
}

/// An empty value or `"null"` means the top level.
fn parse_folder_field(value: &str) -> Result<Option<FolderId>, AppError> {
    let value = value.trim();
    if value.is_empty() || value == "null" {
        return Ok(None);
    }
    value
        .parse::<FolderId>()
        .map(Some)
        .map_err(|_| AppError::validation(format!("Invalid folder_id: {value}")))
}
