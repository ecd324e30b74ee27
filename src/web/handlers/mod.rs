//! API handlers for the Web API.

pub mod auth;
pub mod events;
pub mod file;
pub mod share;
pub mod trash;

pub use auth::*;
pub use events::*;
pub use file::*;
pub use share::*;
pub use trash::*;

use std::sync::Arc;

use crate::file::FileService;
use crate::identity::IdentityVerifier;
use crate::notify::SessionRegistry;
use crate::storage::BlobStore;
use crate::web::middleware::JwtState;
use crate::Database;

/// Shared database handle for the Web API.
pub type SharedDatabase = Arc<Database>;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database handle.
    pub db: SharedDatabase,
    /// Blob storage backend.
    pub blob_store: Arc<dyn BlobStore>,
    /// Live notification sessions.
    pub sessions: Arc<SessionRegistry>,
    /// Identity provider token verifier.
    pub identity_verifier: Arc<dyn IdentityVerifier>,
    /// JWT signing state.
    pub jwt: Arc<JwtState>,
    /// Access token expiry in seconds.
    pub access_token_expiry: u64,
    /// Signed download link lifetime in seconds.
    pub download_url_ttl: u64,
    /// Maximum upload size in bytes.
    pub max_upload_size: u64,
}

impl AppState {
    /// Build a file service over this state.
    pub fn file_service(&self) -> FileService<'_> {
        FileService::new(self.db.pool(), self.blob_store.as_ref(), &self.sessions)
            .with_max_upload_size(self.max_upload_size)
    }
}
