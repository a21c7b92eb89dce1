//! File repository implementation.

use sqlx::{PgConnection, PgPool};

use cloudio_core::error::AppError;
use cloudio_core::result::AppResult;
use cloudio_core::types::{FileId, FolderId, ItemKind, OwnerId};
use cloudio_entity::{ContentType, File};

use super::folder::FolderRepository;
use super::{db_error, like_pattern, write_error};
use crate::store::{EntryPatch, TypeTotals};

/// Repository for file records.
#[derive(Debug, Clone)]
pub struct FileRepository {
    pool: PgPool,
}

impl FileRepository {
    /// Create a new file repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a file by ID within the owner's tree.
    pub async fn find_by_id(&self, id: FileId, owner: &OwnerId) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>("SELECT * FROM files WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to find file", e))
    }

    /// List files directly inside `parent` (None = top level), by name.
    pub async fn find_children(
        &self,
        parent: Option<FolderId>,
        owner: &OwnerId,
    ) -> AppResult<Vec<File>> {
        sqlx::query_as::<_, File>(
            "SELECT * FROM files \
             WHERE owner_id = $1 AND parent_id IS NOT DISTINCT FROM $2 \
             ORDER BY name COLLATE \"C\" ASC",
        )
        .bind(owner)
        .bind(parent)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list files", e))
    }

    /// Exact-name lookup among the files of `parent`.
    pub async fn find_by_name(
        &self,
        parent: Option<FolderId>,
        owner: &OwnerId,
        name: &str,
    ) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>(
            "SELECT * FROM files \
             WHERE owner_id = $1 AND parent_id IS NOT DISTINCT FROM $2 AND name = $3",
        )
        .bind(owner)
        .bind(parent)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find file by name", e))
    }

    /// Case-insensitive substring search over file names.
    pub async fn search(&self, owner: &OwnerId, query: &str, limit: usize) -> AppResult<Vec<File>> {
        sqlx::query_as::<_, File>(
            "SELECT * FROM files WHERE owner_id = $1 AND name ILIKE $2 \
             ORDER BY name COLLATE \"C\" ASC LIMIT $3",
        )
        .bind(owner)
        .bind(like_pattern(query))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to search files", e))
    }

    /// Total bytes and file count per content category.
    pub async fn usage_by_type(&self, owner: &OwnerId) -> AppResult<TypeTotals> {
        let rows: Vec<(ContentType, i64, i64)> = sqlx::query_as(
            "SELECT content_type, COALESCE(SUM(size), 0)::BIGINT, COUNT(*) \
             FROM files WHERE owner_id = $1 GROUP BY content_type",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to aggregate storage usage", e))?;

        Ok(rows
            .into_iter()
            .map(|(content_type, size, count)| {
                (content_type, size.max(0) as u64, count.max(0) as u64)
            })
            .collect())
    }

    /// Number of the owner's files that point at `blob_key`.
    pub async fn count_by_blob_key(&self, owner: &OwnerId, blob_key: &str) -> AppResult<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM files WHERE owner_id = $1 AND blob_key = $2")
                .bind(owner)
                .bind(blob_key)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| db_error("Failed to count blob references", e))?;
        Ok(count.max(0) as u64)
    }

    /// Insert a file. The parent must belong to the same owner.
    pub async fn insert(conn: &mut PgConnection, file: &File) -> AppResult<()> {
        let size = i64::try_from(file.size)
            .map_err(|_| AppError::validation(format!("File size {} out of range", file.size)))?;

        let result = sqlx::query(
            "INSERT INTO files \
                (id, name, size, content_type, blob_key, url, parent_id, owner_id, created_at, modified_at) \
             SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9, $10 \
             WHERE $7::uuid IS NULL \
                OR EXISTS (SELECT 1 FROM folders WHERE id = $7 AND owner_id = $8)",
        )
        .bind(file.id)
        .bind(&file.name)
        .bind(size)
        .bind(file.content_type)
        .bind(&file.blob_key)
        .bind(&file.url)
        .bind(file.parent_id)
        .bind(&file.owner_id)
        .bind(file.created_at)
        .bind(file.modified_at)
        .execute(conn)
        .await
        .map_err(|e| write_error(ItemKind::File, Some(&file.name), e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Parent folder not found"));
        }
        Ok(())
    }

    /// Apply a patch to an existing file.
    pub async fn update(
        conn: &mut PgConnection,
        id: FileId,
        owner: &OwnerId,
        patch: &EntryPatch,
    ) -> AppResult<()> {
        if let Some(Some(parent)) = patch.parent_id {
            if !FolderRepository::exists(&mut *conn, parent, owner).await? {
                return Err(AppError::not_found(format!("Parent folder {parent} not found")));
            }
        }

        let result = sqlx::query(
            "UPDATE files SET \
                name = COALESCE($3, name), \
                parent_id = CASE WHEN $4 THEN $5 ELSE parent_id END, \
                modified_at = $6 \
             WHERE id = $1 AND owner_id = $2",
        )
        .bind(id)
        .bind(owner)
        .bind(patch.name.as_deref())
        .bind(patch.parent_id.is_some())
        .bind(patch.parent_id.flatten())
        .bind(patch.modified_at)
        .execute(conn)
        .await
        .map_err(|e| write_error(ItemKind::File, patch.name.as_deref(), e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("File {id} not found")));
        }
        Ok(())
    }

    /// Share-lock a file row for the rest of the transaction, so a
    /// concurrent delete waits for the caller to commit.
    pub async fn require(conn: &mut PgConnection, id: FileId, owner: &OwnerId) -> AppResult<()> {
        sqlx::query_scalar::<_, FileId>(
            "SELECT id FROM files WHERE id = $1 AND owner_id = $2 FOR SHARE",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(conn)
        .await
        .map_err(|e| db_error("Failed to lock file", e))?
        .map(|_| ())
        .ok_or_else(|| AppError::not_found(format!("File {id} not found")))
    }

    /// Delete a file record.
    pub async fn delete(conn: &mut PgConnection, id: FileId, owner: &OwnerId) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM files WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner)
            .execute(conn)
            .await
            .map_err(|e| db_error("Failed to delete file", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("File {id} not found")));
        }
        Ok(())
    }
}
