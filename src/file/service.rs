//! File service for filedock.
//!
//! High-level file operations:
//! - Upload with validation and blob storage
//! - Download with access control
//! - Rename, trash, restore and purge lifecycle
//! - Listing of visible and trashed files

use sqlx::SqlitePool;
use tracing::warn;

use crate::db::UserRepository;
use crate::notify::{Event, SessionRegistry};
use crate::share::{access, SharedFile, ShareRepository};
use crate::storage::BlobStore;
use crate::{FiledockError, Result};

use super::metadata::{FileRecord, FileRepository, NewFile};
use super::MAX_FILENAME_LENGTH;

/// Request data for file upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Original filename.
    pub name: String,
    /// MIME type.
    pub mime_type: String,
    /// File content.
    pub content: Vec<u8>,
}

impl UploadRequest {
    /// Create a new upload request.
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            content,
        }
    }
}

/// Result of a file download.
#[derive(Debug)]
pub struct DownloadResult {
    /// File metadata.
    pub metadata: FileRecord,
    /// File content.
    pub content: Vec<u8>,
}

/// What a delete request resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The owner moved the file to trash.
    OwnerTrashed,
    /// A recipient removed their own grant; the file is untouched.
    ShareRemoved,
}

/// File service coordinating metadata, blob storage and notifications.
pub struct FileService<'a> {
    pool: &'a SqlitePool,
    blob_store: &'a dyn BlobStore,
    sessions: &'a SessionRegistry,
    max_upload_size: u64,
}

impl<'a> FileService<'a> {
    /// Create a new FileService.
    pub fn new(
        pool: &'a SqlitePool,
        blob_store: &'a dyn BlobStore,
        sessions: &'a SessionRegistry,
    ) -> Self {
        Self {
            pool,
            blob_store,
            sessions,
            max_upload_size: 100 * 1024 * 1024,
        }
    }

    /// Create a new FileService with a custom upload size limit.
    pub fn with_max_upload_size(mut self, max_size: u64) -> Self {
        self.max_upload_size = max_size;
        self
    }

    /// Upload a file for the given user.
    ///
    /// # Validation
    /// - Filename: non-empty, max 255 characters
    /// - MIME type: non-empty
    /// - Content: max configured size (default 100MB)
    pub async fn upload(&self, request: &UploadRequest, user_id: i64) -> Result<FileRecord> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(FiledockError::Validation(
                "filename must not be empty".to_string(),
            ));
        }
        if name.chars().count() > MAX_FILENAME_LENGTH {
            return Err(FiledockError::Validation(format!(
                "filename must be at most {MAX_FILENAME_LENGTH} characters"
            )));
        }
        if request.mime_type.is_empty() {
            return Err(FiledockError::Validation(
                "MIME type must not be empty".to_string(),
            ));
        }
        if request.content.len() as u64 > self.max_upload_size {
            let max_mb = self.max_upload_size / 1024 / 1024;
            return Err(FiledockError::Validation(format!(
                "file too large (max {max_mb}MB)"
            )));
        }

        let handle = self
            .blob_store
            .put(&request.content, name, &request.mime_type, user_id)?;

        let new_file = NewFile::new(
            name,
            &handle.key,
            &handle.locator,
            &request.mime_type,
            request.content.len() as i64,
            user_id,
        );

        match FileRepository::new(self.pool).create(&new_file).await {
            Ok(file) => Ok(file),
            Err(e) => {
                // The blob is orphaned if we keep it after a failed insert
                if let Err(cleanup) = self.blob_store.delete(&handle.key) {
                    warn!(key = %handle.key, error = %cleanup, "failed to clean up blob after insert error");
                }
                Err(e)
            }
        }
    }

    /// Download a file's content.
    ///
    /// Requires read access. Trashed files are only visible to their owner.
    pub async fn download(&self, file_id: i64, user_id: i64) -> Result<DownloadResult> {
        let file = self.readable_file(file_id, user_id).await?;
        let content = self.blob_store.load(&file.blob_key)?;
        Ok(DownloadResult {
            metadata: file,
            content,
        })
    }

    /// Rename an active file.
    ///
    /// Requires edit access. Trashed files cannot be renamed. Everyone else
    /// who can see the file is notified.
    pub async fn rename(&self, file_id: i64, user_id: i64, new_name: &str) -> Result<FileRecord> {
        let name = new_name.trim();
        if name.is_empty() {
            return Err(FiledockError::Validation(
                "filename must not be empty".to_string(),
            ));
        }
        if name.chars().count() > MAX_FILENAME_LENGTH {
            return Err(FiledockError::Validation(format!(
                "filename must be at most {MAX_FILENAME_LENGTH} characters"
            )));
        }

        // Authorization comes first: a missing file fails can_edit, so the
        // caller cannot tell an absent file from a forbidden one
        if !access::can_edit(self.pool, user_id, file_id).await? {
            return Err(FiledockError::Permission(
                "no edit access to this file".to_string(),
            ));
        }

        let files = FileRepository::new(self.pool);
        let file = files
            .get_by_id(file_id)
            .await?
            .ok_or_else(|| FiledockError::NotFound("file".to_string()))?;

        if file.deleted {
            return Err(FiledockError::Validation(
                "cannot rename a file in trash".to_string(),
            ));
        }

        let old_name = file.name.clone();
        let renamed = files
            .rename(file_id, name)
            .await?
            .ok_or_else(|| FiledockError::NotFound("file".to_string()))?;

        self.notify_audience(&renamed, user_id, Event::FileRenamed {
            file_id,
            old_name,
            new_name: name.to_string(),
        })
        .await?;

        Ok(renamed)
    }

    /// Delete a file.
    ///
    /// For the owner this moves the file to trash; grants stay in place so
    /// that access resumes on restore. For a recipient with delete access it
    /// removes only their own grant.
    pub async fn delete(&self, file_id: i64, user_id: i64) -> Result<DeleteOutcome> {
        if !access::can_delete(self.pool, user_id, file_id).await? {
            return Err(FiledockError::Permission(
                "no delete access to this file".to_string(),
            ));
        }

        let files = FileRepository::new(self.pool);
        let file = files
            .get_by_id(file_id)
            .await?
            .ok_or_else(|| FiledockError::NotFound("file".to_string()))?;

        if file.owner_id == user_id {
            files.set_deleted(file_id, true).await?;
            self.notify_audience(&file, user_id, Event::FileDeleted {
                file_id,
                file_name: file.name.clone(),
            })
            .await?;
            return Ok(DeleteOutcome::OwnerTrashed);
        }

        ShareRepository::new(self.pool)
            .delete_own(file_id, user_id)
            .await?;
        Ok(DeleteOutcome::ShareRemoved)
    }

    /// Restore a trashed file. Owner only.
    pub async fn restore(&self, file_id: i64, user_id: i64) -> Result<FileRecord> {
        if !access::is_owner(self.pool, user_id, file_id).await? {
            return Err(FiledockError::Permission(
                "only the owner can restore a file".to_string(),
            ));
        }

        let files = FileRepository::new(self.pool);
        let file = files
            .get_by_id(file_id)
            .await?
            .ok_or_else(|| FiledockError::NotFound("file".to_string()))?;

        if !file.deleted {
            return Err(FiledockError::Validation(
                "file is not in trash".to_string(),
            ));
        }

        files.set_deleted(file_id, false).await?;
        files
            .get_by_id(file_id)
            .await?
            .ok_or_else(|| FiledockError::NotFound("file".to_string()))
    }

    /// Permanently remove a trashed file. Owner only.
    ///
    /// Grants and the metadata row go in one transaction; the blob is
    /// removed afterwards, and a failure there only logs a warning since
    /// the file is already gone from the user's point of view.
    pub async fn purge(&self, file_id: i64, user_id: i64) -> Result<()> {
        if !access::is_owner(self.pool, user_id, file_id).await? {
            return Err(FiledockError::Permission(
                "only the owner can purge a file".to_string(),
            ));
        }

        let files = FileRepository::new(self.pool);
        let file = files
            .get_by_id(file_id)
            .await?
            .ok_or_else(|| FiledockError::NotFound("file".to_string()))?;

        if !file.deleted {
            return Err(FiledockError::Validation(
                "file must be in trash before it can be purged".to_string(),
            ));
        }

        files.purge(file_id).await?;

        if let Err(e) = self.blob_store.delete(&file.blob_key) {
            warn!(key = %file.blob_key, error = %e, "failed to delete blob for purged file");
        }

        Ok(())
    }

    /// List the files visible to a user: active files they own plus files
    /// shared with them, each with an optional name filter.
    pub async fn list_visible(
        &self,
        user_id: i64,
        query: Option<&str>,
    ) -> Result<(Vec<FileRecord>, Vec<SharedFile>)> {
        let owned = FileRepository::new(self.pool)
            .list_owned(user_id, query)
            .await?;
        let shared = ShareRepository::new(self.pool)
            .list_files_shared_with(user_id, query)
            .await?;
        Ok((owned, shared))
    }

    /// List a user's trashed files.
    pub async fn list_trash(&self, user_id: i64) -> Result<Vec<FileRecord>> {
        FileRepository::new(self.pool).list_trashed(user_id).await
    }

    /// Fetch a file the user is allowed to read.
    ///
    /// Authorization runs before the record is touched: a missing file
    /// produces the same permission error as a file the user has no grant
    /// for.
    async fn readable_file(&self, file_id: i64, user_id: i64) -> Result<FileRecord> {
        if !access::can_read(self.pool, user_id, file_id).await? {
            return Err(FiledockError::Permission(
                "no read access to this file".to_string(),
            ));
        }

        let file = FileRepository::new(self.pool)
            .get_by_id(file_id)
            .await?
            .ok_or_else(|| FiledockError::NotFound("file".to_string()))?;

        if file.deleted && file.owner_id != user_id {
            return Err(FiledockError::NotFound("file".to_string()));
        }
        Ok(file)
    }

    /// Notify everyone who can see a file, except the actor.
    async fn notify_audience(&self, file: &FileRecord, actor_id: i64, event: Event) -> Result<()> {
        let mut audience = ShareRepository::new(self.pool)
            .grantee_ids(file.id)
            .await?;
        audience.push(file.owner_id);
        audience.retain(|&id| id != actor_id);
        self.sessions.send_to_all(&audience, event).await;
        Ok(())
    }

    /// Look up a user's display name, for event payloads.
    pub async fn display_name(&self, user_id: i64) -> Result<String> {
        let user = UserRepository::new(self.pool)
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| FiledockError::NotFound("user".to_string()))?;
        Ok(user.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, NewUser, UserRepository};
    use crate::share::{NewShare, Permission};
    use crate::storage::LocalBlobStore;
    use tempfile::TempDir;

    struct Fixture {
        db: Database,
        store: LocalBlobStore,
        sessions: SessionRegistry,
        _dir: TempDir,
        owner: i64,
        other: i64,
    }

    async fn fixture() -> Fixture {
        let db = Database::open_in_memory().await.unwrap();
        let dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(dir.path()).unwrap();
        let users = UserRepository::new(db.pool());
        let owner = users
            .create(&NewUser::new("owner@example.com", "Owner", "ext-o"))
            .await
            .unwrap()
            .id;
        let other = users
            .create(&NewUser::new("other@example.com", "Other", "ext-x"))
            .await
            .unwrap()
            .id;
        Fixture {
            db,
            store,
            sessions: SessionRegistry::new(),
            _dir: dir,
            owner,
            other,
        }
    }

    impl Fixture {
        fn service(&self) -> FileService<'_> {
            FileService::new(self.db.pool(), &self.store, &self.sessions)
        }

        async fn grant(&self, file_id: i64, grantee: i64, permission: Permission) {
            ShareRepository::new(self.db.pool())
                .upsert(&NewShare {
                    file_id,
                    grantee_id: grantee,
                    granter_id: self.owner,
                    permission,
                })
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_upload_and_download() {
        let fx = fixture().await;
        let svc = fx.service();

        let file = svc
            .upload(
                &UploadRequest::new("hello.txt", "text/plain", b"hi there".to_vec()),
                fx.owner,
            )
            .await
            .unwrap();
        assert_eq!(file.size, 8);
        assert!(!file.deleted);

        let result = svc.download(file.id, fx.owner).await.unwrap();
        assert_eq!(result.content, b"hi there");

        // Non-owner with no grant cannot download
        assert!(matches!(
            svc.download(file.id, fx.other).await,
            Err(FiledockError::Permission(_))
        ));
    }

    #[tokio::test]
    async fn test_upload_rejects_oversized() {
        let fx = fixture().await;
        let svc = fx.service().with_max_upload_size(4);

        let err = svc
            .upload(
                &UploadRequest::new("big.bin", "application/octet-stream", vec![0; 5]),
                fx.owner,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, FiledockError::Validation(_)));
    }

    #[tokio::test]
    async fn test_upload_rejects_bad_names() {
        let fx = fixture().await;
        let svc = fx.service();

        assert!(svc
            .upload(&UploadRequest::new("  ", "text/plain", vec![]), fx.owner)
            .await
            .is_err());
        assert!(svc
            .upload(
                &UploadRequest::new("a".repeat(256), "text/plain", vec![]),
                fx.owner
            )
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_rename_requires_edit_access() {
        let fx = fixture().await;
        let svc = fx.service();
        let file = svc
            .upload(
                &UploadRequest::new("a.txt", "text/plain", vec![]),
                fx.owner,
            )
            .await
            .unwrap();

        fx.grant(file.id, fx.other, Permission::Read).await;
        assert!(matches!(
            svc.rename(file.id, fx.other, "b.txt").await,
            Err(FiledockError::Permission(_))
        ));

        fx.grant(file.id, fx.other, Permission::Edit).await;
        let renamed = svc.rename(file.id, fx.other, "b.txt").await.unwrap();
        assert_eq!(renamed.name, "b.txt");
    }

    #[tokio::test]
    async fn test_rename_rejected_for_trashed_file() {
        let fx = fixture().await;
        let svc = fx.service();
        let file = svc
            .upload(
                &UploadRequest::new("a.txt", "text/plain", vec![]),
                fx.owner,
            )
            .await
            .unwrap();

        svc.delete(file.id, fx.owner).await.unwrap();
        assert!(matches!(
            svc.rename(file.id, fx.owner, "b.txt").await,
            Err(FiledockError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_branches_on_caller() {
        let fx = fixture().await;
        let svc = fx.service();
        let file = svc
            .upload(
                &UploadRequest::new("a.txt", "text/plain", vec![]),
                fx.owner,
            )
            .await
            .unwrap();
        fx.grant(file.id, fx.other, Permission::Delete).await;

        // Recipient delete removes only their grant
        let outcome = svc.delete(file.id, fx.other).await.unwrap();
        assert_eq!(outcome, DeleteOutcome::ShareRemoved);
        let file_after = FileRepository::new(fx.db.pool())
            .get_by_id(file.id)
            .await
            .unwrap()
            .unwrap();
        assert!(!file_after.deleted);
        assert!(!access::can_read(fx.db.pool(), fx.other, file.id)
            .await
            .unwrap());

        // Owner delete trashes the file
        let outcome = svc.delete(file.id, fx.owner).await.unwrap();
        assert_eq!(outcome, DeleteOutcome::OwnerTrashed);
        assert!(FileRepository::new(fx.db.pool())
            .get_by_id(file.id)
            .await
            .unwrap()
            .unwrap()
            .deleted);
    }

    #[tokio::test]
    async fn test_recipient_without_delete_grant_cannot_delete() {
        let fx = fixture().await;
        let svc = fx.service();
        let file = svc
            .upload(
                &UploadRequest::new("a.txt", "text/plain", vec![]),
                fx.owner,
            )
            .await
            .unwrap();
        fx.grant(file.id, fx.other, Permission::Edit).await;

        assert!(matches!(
            svc.delete(file.id, fx.other).await,
            Err(FiledockError::Permission(_))
        ));
    }

    #[tokio::test]
    async fn test_grants_survive_trash_restore() {
        let fx = fixture().await;
        let svc = fx.service();
        let file = svc
            .upload(
                &UploadRequest::new("a.txt", "text/plain", vec![]),
                fx.owner,
            )
            .await
            .unwrap();
        fx.grant(file.id, fx.other, Permission::Read).await;

        svc.delete(file.id, fx.owner).await.unwrap();

        // Trashed files do not show up in the recipient's shared list
        let (_, shared) = svc.list_visible(fx.other, None).await.unwrap();
        assert!(shared.is_empty());

        svc.restore(file.id, fx.owner).await.unwrap();
        let (_, shared) = svc.list_visible(fx.other, None).await.unwrap();
        assert_eq!(shared.len(), 1);
        assert_eq!(shared[0].file_id, file.id);
    }

    #[tokio::test]
    async fn test_restore_is_owner_only() {
        let fx = fixture().await;
        let svc = fx.service();
        let file = svc
            .upload(
                &UploadRequest::new("a.txt", "text/plain", vec![]),
                fx.owner,
            )
            .await
            .unwrap();
        svc.delete(file.id, fx.owner).await.unwrap();

        assert!(matches!(
            svc.restore(file.id, fx.other).await,
            Err(FiledockError::Permission(_))
        ));
    }

    #[tokio::test]
    async fn test_purge_requires_trashed() {
        let fx = fixture().await;
        let svc = fx.service();
        let file = svc
            .upload(
                &UploadRequest::new("a.txt", "text/plain", b"x".to_vec()),
                fx.owner,
            )
            .await
            .unwrap();

        assert!(matches!(
            svc.purge(file.id, fx.owner).await,
            Err(FiledockError::Validation(_))
        ));

        svc.delete(file.id, fx.owner).await.unwrap();
        svc.purge(file.id, fx.owner).await.unwrap();

        assert!(FileRepository::new(fx.db.pool())
            .get_by_id(file.id)
            .await
            .unwrap()
            .is_none());
        assert!(fx.store.load(&file.blob_key).is_err());
        // The row is gone, so ownership can no longer be established
        assert!(matches!(
            svc.purge(file.id, fx.owner).await,
            Err(FiledockError::Permission(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_file_not_distinguishable_from_forbidden() {
        let fx = fixture().await;
        let svc = fx.service();
        let file = svc
            .upload(
                &UploadRequest::new("a.txt", "text/plain", vec![]),
                fx.owner,
            )
            .await
            .unwrap();

        // A caller with no access gets the same error whether the file
        // exists or not
        for id in [file.id, 9999] {
            assert!(matches!(
                svc.download(id, fx.other).await,
                Err(FiledockError::Permission(_))
            ));
            assert!(matches!(
                svc.rename(id, fx.other, "b.txt").await,
                Err(FiledockError::Permission(_))
            ));
            assert!(matches!(
                svc.delete(id, fx.other).await,
                Err(FiledockError::Permission(_))
            ));
            assert!(matches!(
                svc.restore(id, fx.other).await,
                Err(FiledockError::Permission(_))
            ));
            assert!(matches!(
                svc.purge(id, fx.other).await,
                Err(FiledockError::Permission(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_owner_trash_emits_events() {
        let fx = fixture().await;
        let svc = fx.service();
        let file = svc
            .upload(
                &UploadRequest::new("a.txt", "text/plain", vec![]),
                fx.owner,
            )
            .await
            .unwrap();
        fx.grant(file.id, fx.other, Permission::Read).await;

        let (_id, mut rx) = fx.sessions.register(fx.other).await;
        svc.delete(file.id, fx.owner).await.unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            Event::FileDeleted {
                file_id: file.id,
                file_name: "a.txt".to_string(),
            }
        );
    }
}
