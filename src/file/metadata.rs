//! File metadata types and repository for filedock.

use sqlx::SqlitePool;

use crate::{FiledockError, Result};

/// Metadata for a stored file.
///
/// `deleted` is the soft-delete flag: active files carry `false`, trashed
/// files `true`. A purged file has no row at all.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FileRecord {
    /// Unique file ID.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Blob storage key.
    pub blob_key: String,
    /// Blob storage locator.
    pub blob_locator: String,
    /// MIME type.
    pub mime_type: String,
    /// Size in bytes.
    pub size: i64,
    /// Owning user ID (immutable).
    pub owner_id: i64,
    /// Soft-delete flag.
    pub deleted: bool,
    /// When the file was uploaded.
    pub created_at: String,
    /// When the file was last modified.
    pub updated_at: String,
}

/// Data for creating a new file entry.
#[derive(Debug, Clone)]
pub struct NewFile {
    /// Display name.
    pub name: String,
    /// Blob storage key.
    pub blob_key: String,
    /// Blob storage locator.
    pub blob_locator: String,
    /// MIME type.
    pub mime_type: String,
    /// Size in bytes.
    pub size: i64,
    /// Owning user ID.
    pub owner_id: i64,
}

impl NewFile {
    /// Create a new NewFile.
    pub fn new(
        name: impl Into<String>,
        blob_key: impl Into<String>,
        blob_locator: impl Into<String>,
        mime_type: impl Into<String>,
        size: i64,
        owner_id: i64,
    ) -> Self {
        Self {
            name: name.into(),
            blob_key: blob_key.into(),
            blob_locator: blob_locator.into(),
            mime_type: mime_type.into(),
            size,
            owner_id,
        }
    }
}

const FILE_COLUMNS: &str =
    "id, name, blob_key, blob_locator, mime_type, size, owner_id, deleted, created_at, updated_at";

/// Repository for file metadata operations.
pub struct FileRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FileRepository<'a> {
    /// Create a new FileRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new file entry (in the active state).
    pub async fn create(&self, file: &NewFile) -> Result<FileRecord> {
        let result = sqlx::query(
            "INSERT INTO files (name, blob_key, blob_locator, mime_type, size, owner_id)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&file.name)
        .bind(&file.blob_key)
        .bind(&file.blob_locator)
        .bind(&file.mime_type)
        .bind(file.size)
        .bind(file.owner_id)
        .execute(self.pool)
        .await
        .map_err(|e| FiledockError::Database(e.to_string()))?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| FiledockError::NotFound("file".to_string()))
    }

    /// Get a file by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<FileRecord>> {
        let result = sqlx::query_as::<_, FileRecord>(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| FiledockError::Database(e.to_string()))?;

        Ok(result)
    }

    /// Rename a file.
    ///
    /// Returns the updated record, or None if not found.
    pub async fn rename(&self, id: i64, name: &str) -> Result<Option<FileRecord>> {
        let result =
            sqlx::query("UPDATE files SET name = ?, updated_at = datetime('now') WHERE id = ?")
                .bind(name)
                .bind(id)
                .execute(self.pool)
                .await
                .map_err(|e| FiledockError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(id).await
    }

    /// Set the soft-delete flag.
    ///
    /// Returns true if the file existed.
    pub async fn set_deleted(&self, id: i64, deleted: bool) -> Result<bool> {
        let result =
            sqlx::query("UPDATE files SET deleted = ?, updated_at = datetime('now') WHERE id = ?")
                .bind(deleted)
                .bind(id)
                .execute(self.pool)
                .await
                .map_err(|e| FiledockError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// List a user's active (non-trashed) files, newest first.
    ///
    /// An optional case-insensitive substring filter applies to the name.
    pub async fn list_owned(&self, owner_id: i64, query: Option<&str>) -> Result<Vec<FileRecord>> {
        let files = match query {
            Some(q) => {
                sqlx::query_as::<_, FileRecord>(&format!(
                    "SELECT {FILE_COLUMNS} FROM files
                     WHERE owner_id = ? AND deleted = 0 AND name LIKE '%' || ? || '%'
                     ORDER BY created_at DESC"
                ))
                .bind(owner_id)
                .bind(q)
                .fetch_all(self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, FileRecord>(&format!(
                    "SELECT {FILE_COLUMNS} FROM files
                     WHERE owner_id = ? AND deleted = 0
                     ORDER BY created_at DESC"
                ))
                .bind(owner_id)
                .fetch_all(self.pool)
                .await
            }
        }
        .map_err(|e| FiledockError::Database(e.to_string()))?;

        Ok(files)
    }

    /// List a user's trashed files, most recently touched first.
    pub async fn list_trashed(&self, owner_id: i64) -> Result<Vec<FileRecord>> {
        let files = sqlx::query_as::<_, FileRecord>(&format!(
            "SELECT {FILE_COLUMNS} FROM files
             WHERE owner_id = ? AND deleted = 1
             ORDER BY updated_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| FiledockError::Database(e.to_string()))?;

        Ok(files)
    }

    /// List a user's files that have at least one outstanding grant.
    pub async fn list_owned_with_shares(&self, owner_id: i64) -> Result<Vec<FileRecord>> {
        let files = sqlx::query_as::<_, FileRecord>(&format!(
            "SELECT {FILE_COLUMNS} FROM files f
             WHERE owner_id = ?
               AND EXISTS (SELECT 1 FROM file_shares s WHERE s.file_id = f.id)
             ORDER BY created_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| FiledockError::Database(e.to_string()))?;

        Ok(files)
    }

    /// Purge a file: delete its grants and its row in one transaction.
    ///
    /// Returns true if the file row existed. Blob removal is the caller's
    /// responsibility, after this commit.
    pub async fn purge(&self, id: i64) -> Result<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| FiledockError::Database(e.to_string()))?;

        sqlx::query("DELETE FROM file_shares WHERE file_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| FiledockError::Database(e.to_string()))?;

        let result = sqlx::query("DELETE FROM files WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| FiledockError::Database(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| FiledockError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{NewUser, UserRepository};
    use crate::share::{NewShare, Permission, ShareRepository};
    use crate::Database;

    async fn seed_owner(db: &Database) -> i64 {
        UserRepository::new(db.pool())
            .create(&NewUser::new("owner@example.com", "Owner", "ext-o"))
            .await
            .unwrap()
            .id
    }

    fn new_file(owner_id: i64, name: &str) -> NewFile {
        NewFile::new(
            name,
            format!("key-{name}"),
            format!("local://key-{name}"),
            "text/plain",
            42,
            owner_id,
        )
    }

    #[tokio::test]
    async fn test_create_starts_active() {
        let db = Database::open_in_memory().await.unwrap();
        let owner = seed_owner(&db).await;
        let repo = FileRepository::new(db.pool());

        let file = repo.create(&new_file(owner, "a.txt")).await.unwrap();
        assert!(!file.deleted);
        assert_eq!(file.owner_id, owner);
        assert_eq!(file.size, 42);
    }

    #[tokio::test]
    async fn test_rename() {
        let db = Database::open_in_memory().await.unwrap();
        let owner = seed_owner(&db).await;
        let repo = FileRepository::new(db.pool());

        let file = repo.create(&new_file(owner, "a.txt")).await.unwrap();
        let renamed = repo.rename(file.id, "b.txt").await.unwrap().unwrap();
        assert_eq!(renamed.name, "b.txt");

        assert!(repo.rename(9999, "x").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_trash_and_restore_round_trip() {
        let db = Database::open_in_memory().await.unwrap();
        let owner = seed_owner(&db).await;
        let repo = FileRepository::new(db.pool());

        let file = repo.create(&new_file(owner, "a.txt")).await.unwrap();

        assert!(repo.set_deleted(file.id, true).await.unwrap());
        assert!(repo.get_by_id(file.id).await.unwrap().unwrap().deleted);
        assert_eq!(repo.list_owned(owner, None).await.unwrap().len(), 0);
        assert_eq!(repo.list_trashed(owner).await.unwrap().len(), 1);

        assert!(repo.set_deleted(file.id, false).await.unwrap());
        assert_eq!(repo.list_owned(owner, None).await.unwrap().len(), 1);
        assert_eq!(repo.list_trashed(owner).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_list_owned_search() {
        let db = Database::open_in_memory().await.unwrap();
        let owner = seed_owner(&db).await;
        let repo = FileRepository::new(db.pool());

        repo.create(&new_file(owner, "Quarterly Report.pdf"))
            .await
            .unwrap();
        repo.create(&new_file(owner, "notes.txt")).await.unwrap();

        let hits = repo.list_owned(owner, Some("report")).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Quarterly Report.pdf");

        let all = repo.list_owned(owner, None).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_purge_cascades_shares() {
        let db = Database::open_in_memory().await.unwrap();
        let owner = seed_owner(&db).await;
        let grantee = UserRepository::new(db.pool())
            .create(&NewUser::new("g@example.com", "G", "ext-g"))
            .await
            .unwrap()
            .id;
        let repo = FileRepository::new(db.pool());
        let shares = ShareRepository::new(db.pool());

        let file = repo.create(&new_file(owner, "a.txt")).await.unwrap();
        shares
            .upsert(&NewShare {
                file_id: file.id,
                grantee_id: grantee,
                granter_id: owner,
                permission: Permission::Read,
            })
            .await
            .unwrap();

        assert!(repo.purge(file.id).await.unwrap());
        assert!(repo.get_by_id(file.id).await.unwrap().is_none());
        assert!(shares.list_for_file(file.id).await.unwrap().is_empty());

        // Purging again reports the row as already gone
        assert!(!repo.purge(file.id).await.unwrap());
    }
}
