//! Request DTOs for Web API.

use serde::Deserialize;
use validator::Validate;

use crate::share::Permission;

use super::validation::not_empty_trimmed;

/// Login request: an identity provider token to exchange for a session.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Token issued by the identity provider.
    #[validate(custom(function = "not_empty_trimmed"))]
    pub id_token: String,
}

/// File rename request.
#[derive(Debug, Deserialize, Validate)]
pub struct RenameRequest {
    /// New display name.
    #[validate(
        custom(function = "not_empty_trimmed"),
        length(max = 255, message = "Name must be at most 255 characters")
    )]
    pub name: String,
}

/// Share creation request.
#[derive(Debug, Deserialize, Validate)]
pub struct ShareRequest {
    /// Email address of the recipient.
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    /// Permission level to grant.
    pub permission: Permission,
}

/// Share permission update request.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePermissionRequest {
    /// New permission level.
    pub permission: Permission,
}

/// Trash restore request.
#[derive(Debug, Deserialize, Validate)]
pub struct RestoreRequest {
    /// File to restore.
    pub file_id: i64,
}

/// Query parameters for file listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Optional case-insensitive name filter.
    #[serde(default)]
    pub q: Option<String>,
}

/// Query parameters for trash purge.
#[derive(Debug, Deserialize)]
pub struct PurgeQuery {
    /// File to purge.
    pub file_id: i64,
}

/// Query parameters for token-authenticated content download.
#[derive(Debug, Deserialize)]
pub struct DownloadTokenQuery {
    /// Signed download token.
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_share_request_email_validation() {
        let req = ShareRequest {
            email: "not-an-email".to_string(),
            permission: Permission::Read,
        };
        assert!(req.validate().is_err());

        let req = ShareRequest {
            email: "b@example.com".to_string(),
            permission: Permission::Read,
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_rename_request_validation() {
        let req = RenameRequest {
            name: "  ".to_string(),
        };
        assert!(req.validate().is_err());

        let req = RenameRequest {
            name: "a".repeat(256),
        };
        assert!(req.validate().is_err());

        let req = RenameRequest {
            name: "notes.txt".to_string(),
        };
        assert!(req.validate().is_ok());
    }
}
