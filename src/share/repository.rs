//! Share repository for filedock.

use sqlx::SqlitePool;

use super::model::{NewShare, Permission, Share, ShareWithGrantee};
use crate::{FiledockError, Result};

/// A non-trashed file visible to a grantee, joined with its grant.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SharedFile {
    /// File ID.
    pub file_id: i64,
    /// File display name.
    pub name: String,
    /// MIME type.
    pub mime_type: String,
    /// Size in bytes.
    pub size: i64,
    /// Owner user ID.
    pub owner_id: i64,
    /// Owner display name.
    pub owner_name: String,
    /// Owner email.
    pub owner_email: String,
    /// Permission granted to the viewer.
    #[sqlx(try_from = "String")]
    pub permission: Permission,
    /// File creation timestamp.
    pub created_at: String,
    /// File last-modified timestamp.
    pub updated_at: String,
}

/// Repository for share grant operations.
pub struct ShareRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ShareRepository<'a> {
    /// Create a new ShareRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a grant, or update the existing one for the same
    /// (file, grantee) pair in place.
    ///
    /// The upsert rides on the UNIQUE(file_id, grantee_id) constraint, so
    /// two concurrent grant calls cannot produce duplicate rows.
    pub async fn upsert(&self, new_share: &NewShare) -> Result<Share> {
        sqlx::query(
            "INSERT INTO file_shares (file_id, grantee_id, granter_id, permission)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(file_id, grantee_id) DO UPDATE SET
                 permission = excluded.permission,
                 granter_id = excluded.granter_id,
                 updated_at = datetime('now')",
        )
        .bind(new_share.file_id)
        .bind(new_share.grantee_id)
        .bind(new_share.granter_id)
        .bind(new_share.permission.as_str())
        .execute(self.pool)
        .await
        .map_err(|e| FiledockError::Database(e.to_string()))?;

        self.get_for_grantee(new_share.file_id, new_share.grantee_id)
            .await?
            .ok_or_else(|| FiledockError::NotFound("share".to_string()))
    }

    /// Get a share by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Share>> {
        let result = sqlx::query_as::<_, Share>(
            "SELECT id, file_id, grantee_id, granter_id, permission, created_at, updated_at
             FROM file_shares WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| FiledockError::Database(e.to_string()))?;

        Ok(result)
    }

    /// Get the grant for a specific (file, grantee) pair.
    pub async fn get_for_grantee(&self, file_id: i64, grantee_id: i64) -> Result<Option<Share>> {
        let result = sqlx::query_as::<_, Share>(
            "SELECT id, file_id, grantee_id, granter_id, permission, created_at, updated_at
             FROM file_shares WHERE file_id = ? AND grantee_id = ?",
        )
        .bind(file_id)
        .bind(grantee_id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| FiledockError::Database(e.to_string()))?;

        Ok(result)
    }

    /// List all grants for a file with grantee display attributes.
    pub async fn list_for_file(&self, file_id: i64) -> Result<Vec<ShareWithGrantee>> {
        let shares = sqlx::query_as::<_, ShareWithGrantee>(
            "SELECT s.id, s.file_id, s.grantee_id, s.permission,
                    u.name AS grantee_name, u.email AS grantee_email,
                    u.picture AS grantee_picture,
                    s.created_at, s.updated_at
             FROM file_shares s
             JOIN users u ON u.id = s.grantee_id
             WHERE s.file_id = ?
             ORDER BY s.created_at",
        )
        .bind(file_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| FiledockError::Database(e.to_string()))?;

        Ok(shares)
    }

    /// List the user IDs of everyone a file is shared with.
    pub async fn grantee_ids(&self, file_id: i64) -> Result<Vec<i64>> {
        let ids: Vec<i64> =
            sqlx::query_scalar("SELECT grantee_id FROM file_shares WHERE file_id = ?")
                .bind(file_id)
                .fetch_all(self.pool)
                .await
                .map_err(|e| FiledockError::Database(e.to_string()))?;

        Ok(ids)
    }

    /// Update the permission level of a grant in place.
    ///
    /// Returns the updated share, or None if not found.
    pub async fn update_permission(
        &self,
        id: i64,
        permission: Permission,
    ) -> Result<Option<Share>> {
        let result = sqlx::query(
            "UPDATE file_shares SET permission = ?, updated_at = datetime('now') WHERE id = ?",
        )
        .bind(permission.as_str())
        .bind(id)
        .execute(self.pool)
        .await
        .map_err(|e| FiledockError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(id).await
    }

    /// Delete a grant by ID.
    ///
    /// Returns true if a grant was deleted, false if not found.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM file_shares WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| FiledockError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete the caller's own grant for a file (self-removal of access).
    ///
    /// Returns true if a grant was deleted.
    pub async fn delete_own(&self, file_id: i64, grantee_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM file_shares WHERE file_id = ? AND grantee_id = ?")
            .bind(file_id)
            .bind(grantee_id)
            .execute(self.pool)
            .await
            .map_err(|e| FiledockError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    /// List non-trashed files shared with a user, joined with owner info.
    ///
    /// An optional case-insensitive substring filter applies to the file
    /// name, mirroring the owned-files search.
    pub async fn list_files_shared_with(
        &self,
        grantee_id: i64,
        query: Option<&str>,
    ) -> Result<Vec<SharedFile>> {
        let base = "SELECT f.id AS file_id, f.name, f.mime_type, f.size,
                           f.owner_id, u.name AS owner_name, u.email AS owner_email,
                           s.permission, f.created_at, f.updated_at
                    FROM file_shares s
                    JOIN files f ON f.id = s.file_id
                    JOIN users u ON u.id = f.owner_id
                    WHERE s.grantee_id = ? AND f.deleted = 0";

        let files = match query {
            Some(q) => sqlx::query_as::<_, SharedFile>(&format!(
                "{base} AND f.name LIKE '%' || ? || '%' ORDER BY f.created_at DESC"
            ))
            .bind(grantee_id)
            .bind(q)
            .fetch_all(self.pool)
            .await,
            None => sqlx::query_as::<_, SharedFile>(&format!(
                "{base} ORDER BY f.created_at DESC"
            ))
            .bind(grantee_id)
            .fetch_all(self.pool)
            .await,
        }
        .map_err(|e| FiledockError::Database(e.to_string()))?;

        Ok(files)
    }
}
