//! Authorization engine for filedock.
//!
//! Four pure predicates deciding, per (user, file), what an operation may
//! do. Ownership passes everything; otherwise the decision comes from the
//! caller's share grant. A missing file answers false everywhere so an
//! unauthorized caller cannot distinguish "forbidden" from "absent".
//!
//! No caching: every call re-reads committed state, so a permission change
//! is visible to the very next check.

use sqlx::SqlitePool;

use crate::Result;

/// Fetch a file's owner, or None if the file does not exist.
async fn owner_of(pool: &SqlitePool, file_id: i64) -> Result<Option<i64>> {
    let owner: Option<i64> = sqlx::query_scalar("SELECT owner_id FROM files WHERE id = ?")
        .bind(file_id)
        .fetch_optional(pool)
        .await?;
    Ok(owner)
}

/// Can the user view/download the file?
///
/// True for the owner and for any grant level (every level implies read).
pub async fn can_read(pool: &SqlitePool, user_id: i64, file_id: i64) -> Result<bool> {
    let Some(owner_id) = owner_of(pool, file_id).await? else {
        return Ok(false);
    };
    if owner_id == user_id {
        return Ok(true);
    }

    let grant: Option<i64> = sqlx::query_scalar(
        "SELECT 1 FROM file_shares WHERE file_id = ? AND grantee_id = ?",
    )
    .bind(file_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(grant.is_some())
}

/// Can the user rename the file?
///
/// True for the owner and for grants at edit or delete level.
pub async fn can_edit(pool: &SqlitePool, user_id: i64, file_id: i64) -> Result<bool> {
    let Some(owner_id) = owner_of(pool, file_id).await? else {
        return Ok(false);
    };
    if owner_id == user_id {
        return Ok(true);
    }

    let grant: Option<i64> = sqlx::query_scalar(
        "SELECT 1 FROM file_shares
         WHERE file_id = ? AND grantee_id = ? AND permission IN ('edit', 'delete')",
    )
    .bind(file_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(grant.is_some())
}

/// Can the user invoke the delete operation on the file?
///
/// True for the owner and for grants at exactly delete level. What delete
/// *does* still depends on ownership (soft delete vs share self-removal).
pub async fn can_delete(pool: &SqlitePool, user_id: i64, file_id: i64) -> Result<bool> {
    let Some(owner_id) = owner_of(pool, file_id).await? else {
        return Ok(false);
    };
    if owner_id == user_id {
        return Ok(true);
    }

    let grant: Option<i64> = sqlx::query_scalar(
        "SELECT 1 FROM file_shares
         WHERE file_id = ? AND grantee_id = ? AND permission = 'delete'",
    )
    .bind(file_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(grant.is_some())
}

/// Is the user the file's owner?
pub async fn is_owner(pool: &SqlitePool, user_id: i64, file_id: i64) -> Result<bool> {
    Ok(owner_of(pool, file_id).await? == Some(user_id))
}
