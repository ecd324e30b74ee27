//! Response DTOs for Web API.

use serde::Serialize;

use crate::datetime::to_rfc3339;
use crate::db::User;
use crate::file::{DeleteOutcome, FileRecord};
use crate::share::{SharedFile, ShareWithGrantee};

// ============================================================================
// Generic Response Wrappers
// ============================================================================

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

// ============================================================================
// Auth
// ============================================================================

/// Login response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Access token (JWT).
    pub access_token: String,
    /// Token type (always "Bearer").
    pub token_type: String,
    /// Token lifetime in seconds.
    pub expires_in: u64,
    /// Authenticated user.
    pub user: UserInfo,
}

/// Public user information.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    /// User ID.
    pub id: i64,
    /// Email address.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Avatar URL, if any.
    pub picture: Option<String>,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            picture: user.picture,
        }
    }
}

// ============================================================================
// Files
// ============================================================================

/// File information.
#[derive(Debug, Serialize)]
pub struct FileResponse {
    /// File ID.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// MIME type.
    pub mime_type: String,
    /// Size in bytes.
    pub size: i64,
    /// Owning user ID.
    pub owner_id: i64,
    /// Owner display name, when the file belongs to someone else.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
    /// The caller's relationship to the file: "owner" or a permission level.
    pub permission: String,
    /// Upload timestamp (RFC3339).
    pub created_at: String,
    /// Last modification timestamp (RFC3339).
    pub updated_at: String,
}

impl FileResponse {
    /// Build a response for a file the caller owns.
    pub fn owned(file: &FileRecord) -> Self {
        Self::with_permission(file, "owner")
    }

    /// Build a response reporting the caller's relationship to the file.
    pub fn with_permission(file: &FileRecord, permission: impl Into<String>) -> Self {
        Self {
            id: file.id,
            name: file.name.clone(),
            mime_type: file.mime_type.clone(),
            size: file.size,
            owner_id: file.owner_id,
            owner_name: None,
            permission: permission.into(),
            created_at: to_rfc3339(&file.created_at),
            updated_at: to_rfc3339(&file.updated_at),
        }
    }

    /// Build a response for a file shared with the caller.
    pub fn shared(file: &SharedFile) -> Self {
        Self {
            id: file.file_id,
            name: file.name.clone(),
            mime_type: file.mime_type.clone(),
            size: file.size,
            owner_id: file.owner_id,
            owner_name: Some(file.owner_name.clone()),
            permission: file.permission.to_string(),
            created_at: to_rfc3339(&file.created_at),
            updated_at: to_rfc3339(&file.updated_at),
        }
    }
}

/// Delete response.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    /// What the delete resolved to: "trashed" or "share_removed".
    pub outcome: String,
}

impl From<DeleteOutcome> for DeleteResponse {
    fn from(outcome: DeleteOutcome) -> Self {
        let outcome = match outcome {
            DeleteOutcome::OwnerTrashed => "trashed",
            DeleteOutcome::ShareRemoved => "share_removed",
        };
        Self {
            outcome: outcome.to_string(),
        }
    }
}

/// Signed download link response.
#[derive(Debug, Serialize)]
pub struct DownloadUrlResponse {
    /// Relative URL with an embedded one-file token.
    pub url: String,
    /// Link lifetime in seconds.
    pub expires_in: u64,
}

// ============================================================================
// Shares
// ============================================================================

/// Share information including the recipient.
#[derive(Debug, Serialize)]
pub struct ShareResponse {
    /// Share ID.
    pub id: i64,
    /// File the share applies to.
    pub file_id: i64,
    /// Recipient.
    pub grantee: UserInfo,
    /// Permission level.
    pub permission: String,
    /// When the share was created (RFC3339).
    pub created_at: String,
    /// When the share was last updated (RFC3339).
    pub updated_at: String,
}

impl From<ShareWithGrantee> for ShareResponse {
    fn from(share: ShareWithGrantee) -> Self {
        Self {
            id: share.id,
            file_id: share.file_id,
            grantee: UserInfo {
                id: share.grantee_id,
                email: share.grantee_email,
                name: share.grantee_name,
                picture: share.grantee_picture,
            },
            permission: share.permission.to_string(),
            created_at: to_rfc3339(&share.created_at),
            updated_at: to_rfc3339(&share.updated_at),
        }
    }
}

/// One file the caller has shared out, with its outstanding grants.
#[derive(Debug, Serialize)]
pub struct SharedByMeResponse {
    /// The file.
    pub file: FileResponse,
    /// Grants on the file.
    pub shares: Vec<ShareResponse>,
}
