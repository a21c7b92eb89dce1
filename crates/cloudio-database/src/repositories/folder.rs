//! Folder repository implementation.

use sqlx::{PgConnection, PgPool};

use cloudio_core::error::AppError;
use cloudio_core::result::AppResult;
use cloudio_core::types::{FolderId, ItemKind, OwnerId};
use cloudio_entity::Folder;

use super::{db_error, like_pattern, write_error};
use crate::store::EntryPatch;

/// Repository for folder records.
#[derive(Debug, Clone)]
pub struct FolderRepository {
    pool: PgPool,
}

impl FolderRepository {
    /// Create a new folder repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a folder by ID within the owner's tree.
    pub async fn find_by_id(&self, id: FolderId, owner: &OwnerId) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>("SELECT * FROM folders WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to find folder", e))
    }

    /// List direct child folders of `parent` (None = top level), by name.
    pub async fn find_children(
        &self,
        parent: Option<FolderId>,
        owner: &OwnerId,
    ) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders \
             WHERE owner_id = $1 AND parent_id IS NOT DISTINCT FROM $2 \
             ORDER BY name COLLATE \"C\" ASC",
        )
        .bind(owner)
        .bind(parent)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list child folders", e))
    }

    /// Exact-name lookup among the children of `parent`.
    pub async fn find_by_name(
        &self,
        parent: Option<FolderId>,
        owner: &OwnerId,
        name: &str,
    ) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders \
             WHERE owner_id = $1 AND parent_id IS NOT DISTINCT FROM $2 AND name = $3",
        )
        .bind(owner)
        .bind(parent)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find folder by name", e))
    }

    /// Case-insensitive substring search over folder names.
    pub async fn search(&self, owner: &OwnerId, query: &str, limit: usize) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders WHERE owner_id = $1 AND name ILIKE $2 \
             ORDER BY name COLLATE \"C\" ASC LIMIT $3",
        )
        .bind(owner)
        .bind(like_pattern(query))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to search folders", e))
    }

    /// Number of folders the owner has.
    pub async fn count(&self, owner: &OwnerId) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM folders WHERE owner_id = $1")
            .bind(owner)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("Failed to count folders", e))?;
        Ok(count.max(0) as u64)
    }

    /// Check a connection round trip.
    pub async fn ping(&self) -> AppResult<bool> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|v| v == 1)
            .map_err(|e| db_error("Health check failed", e))
    }

    /// Whether `id` names a folder owned by `owner`.
    pub async fn exists(conn: &mut PgConnection, id: FolderId, owner: &OwnerId) -> AppResult<bool> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM folders WHERE id = $1 AND owner_id = $2)")
            .bind(id)
            .bind(owner)
            .fetch_one(conn)
            .await
            .map_err(|e| db_error("Failed to check folder", e))
    }

    /// Serialize tree-shape changes for one owner until the transaction ends.
    pub async fn lock_tree(conn: &mut PgConnection, owner: &OwnerId) -> AppResult<()> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(owner)
            .execute(conn)
            .await
            .map_err(|e| db_error("Failed to lock folder tree", e))?;
        Ok(())
    }

    /// Whether `folder` is `start` or one of its ancestors.
    pub async fn is_ancestor_or_self(
        conn: &mut PgConnection,
        folder: FolderId,
        start: FolderId,
        owner: &OwnerId,
    ) -> AppResult<bool> {
        sqlx::query_scalar(
            "WITH RECURSIVE chain AS ( \
                SELECT id, parent_id FROM folders WHERE id = $1 AND owner_id = $2 \
                UNION \
                SELECT f.id, f.parent_id FROM folders f \
                JOIN chain c ON f.id = c.parent_id \
                WHERE f.owner_id = $2 \
             ) \
             SELECT EXISTS(SELECT 1 FROM chain WHERE id = $3)",
        )
        .bind(start)
        .bind(owner)
        .bind(folder)
        .fetch_one(conn)
        .await
        .map_err(|e| db_error("Failed to walk folder ancestry", e))
    }

    /// Share-lock a folder row for the rest of the transaction.
    pub async fn require(conn: &mut PgConnection, id: FolderId, owner: &OwnerId) -> AppResult<()> {
        sqlx::query_scalar::<_, FolderId>(
            "SELECT id FROM folders WHERE id = $1 AND owner_id = $2 FOR SHARE",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(conn)
        .await
        .map_err(|e| db_error("Failed to lock folder", e))?
        .map(|_| ())
        .ok_or_else(|| AppError::not_found(format!("Folder {id} not found")))
    }

    /// Insert a folder. The parent must belong to the same owner.
    pub async fn insert(conn: &mut PgConnection, folder: &Folder) -> AppResult<()> {
        let result = sqlx::query(
            "INSERT INTO folders (id, name, parent_id, owner_id, created_at, modified_at) \
             SELECT $1, $2, $3, $4, $5, $6 \
             WHERE $3::uuid IS NULL \
                OR EXISTS (SELECT 1 FROM folders WHERE id = $3 AND owner_id = $4)",
        )
        .bind(folder.id)
        .bind(&folder.name)
        .bind(folder.parent_id)
        .bind(&folder.owner_id)
        .bind(folder.created_at)
        .bind(folder.modified_at)
        .execute(conn)
        .await
        .map_err(|e| write_error(ItemKind::Folder, Some(&folder.name), e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!(
                "Parent folder {} not found",
                folder.parent_id.map(|p| p.to_string()).unwrap_or_default()
            )));
        }
        Ok(())
    }

    /// Apply a patch to an existing folder.
    ///
    /// A re-parent is checked against the committed ancestry of the new
    /// parent; callers hold [`lock_tree`](Self::lock_tree) so concurrent
    /// moves cannot both pass the check.
    pub async fn update(
        conn: &mut PgConnection,
        id: FolderId,
        owner: &OwnerId,
        patch: &EntryPatch,
    ) -> AppResult<()> {
        if let Some(Some(parent)) = patch.parent_id {
            if !Self::exists(&mut *conn, parent, owner).await? {
                return Err(AppError::not_found(format!("Parent folder {parent} not found")));
            }
            if Self::is_ancestor_or_self(&mut *conn, id, parent, owner).await? {
                return Err(AppError::invalid_operation(
                    "Cannot move a folder into itself or one of its subfolders",
                ));
            }
        }

        let result = sqlx::query(
            "UPDATE folders SET \
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
        .map_err(|e| write_error(ItemKind::Folder, patch.name.as_deref(), e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Folder {id} not found")));
        }
        Ok(())
    }

    /// Delete a folder. Fails while any child still references it.
    pub async fn delete(conn: &mut PgConnection, id: FolderId, owner: &OwnerId) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM folders WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner)
            .execute(conn)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                    AppError::internal(format!("Folder {id} still has children"))
                }
                _ => db_error("Failed to delete folder", e),
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Folder {id} not found")));
        }
        Ok(())
    }
}
