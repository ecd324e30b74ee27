//! Blob storage for filedock.
//!
//! File content lives outside the database, addressed by an opaque key.
//! `LocalBlobStore` keeps blobs on the local filesystem under sharded
//! directories; the trait seam exists so an object store backend can be
//! swapped in without touching the file service.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use uuid::Uuid;

use crate::{FiledockError, Result};

/// Handle to a stored blob.
#[derive(Debug, Clone)]
pub struct BlobHandle {
    /// Opaque storage key.
    pub key: String,
    /// Backend-specific locator for the blob.
    pub locator: String,
}

/// Backend-agnostic blob storage.
pub trait BlobStore: Send + Sync {
    /// Store blob content, returning a handle to it.
    ///
    /// MIME type and owner are advisory; an object-store backend can
    /// record them as object metadata, the local backend only logs them.
    fn put(
        &self,
        content: &[u8],
        original_name: &str,
        mime_type: &str,
        owner_id: i64,
    ) -> Result<BlobHandle>;

    /// Load blob content by key.
    fn load(&self, key: &str) -> Result<Vec<u8>>;

    /// Delete a blob by key.
    fn delete(&self, key: &str) -> Result<()>;
}

/// Filesystem-backed blob store.
pub struct LocalBlobStore {
    base_path: PathBuf,
}

impl LocalBlobStore {
    /// Create a new store rooted at the given directory, creating it if needed.
    pub fn new(base_path: impl AsRef<Path>) -> Result<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    /// Resolve a key to its on-disk path.
    ///
    /// Blobs are sharded into subdirectories by the first two characters of
    /// the key to keep directory sizes manageable.
    fn blob_path(&self, key: &str) -> Result<PathBuf> {
        if key.len() < 2 || key.contains('/') || key.contains("..") {
            return Err(FiledockError::Storage(format!("invalid blob key: {key}")));
        }
        Ok(self.base_path.join(&key[..2]).join(key))
    }

    fn generate_key(original_name: &str) -> String {
        let id = Uuid::new_v4().to_string().replace('-', "");
        match Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
        {
            Some(ext) if !ext.is_empty() => format!("{id}.{ext}"),
            _ => id,
        }
    }
}

impl BlobStore for LocalBlobStore {
    fn put(
        &self,
        content: &[u8],
        original_name: &str,
        mime_type: &str,
        owner_id: i64,
    ) -> Result<BlobHandle> {
        let key = Self::generate_key(original_name);
        let path = self.blob_path(&key)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;

        debug!(
            key = %key,
            size = content.len(),
            mime_type = %mime_type,
            owner_id,
            "stored blob"
        );

        Ok(BlobHandle {
            locator: format!("local://{key}"),
            key,
        })
    }

    fn load(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.blob_path(key)?;
        if !path.exists() {
            return Err(FiledockError::NotFound("blob".to_string()));
        }
        Ok(fs::read(&path)?)
    }

    fn delete(&self, key: &str) -> Result<()> {
        let path = self.blob_path(key)?;
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_put_load_delete() {
        let dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(dir.path()).unwrap();

        let handle = store
            .put(b"hello world", "greeting.txt", "text/plain", 1)
            .unwrap();
        assert!(handle.key.ends_with(".txt"));
        assert_eq!(handle.locator, format!("local://{}", handle.key));

        let content = store.load(&handle.key).unwrap();
        assert_eq!(content, b"hello world");

        store.delete(&handle.key).unwrap();
        assert!(matches!(
            store.load(&handle.key),
            Err(FiledockError::NotFound(_))
        ));
    }

    #[test]
    fn test_keys_are_sharded() {
        let dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(dir.path()).unwrap();

        let handle = store
            .put(b"data", "noext", "application/octet-stream", 1)
            .unwrap();
        let shard = dir.path().join(&handle.key[..2]);
        assert!(shard.join(&handle.key).exists());
    }

    #[test]
    fn test_rejects_traversal_keys() {
        let dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(dir.path()).unwrap();

        assert!(store.load("../etc/passwd").is_err());
        assert!(store.delete("a/b").is_err());
    }

    #[test]
    fn test_delete_missing_is_ok() {
        let dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(dir.path()).unwrap();
        store.delete("aabbccdd.txt").unwrap();
    }
}
