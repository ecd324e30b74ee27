//! Share (grant) types for filedock.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Permission level of a share grant.
///
/// Levels form a strict total order: each level includes every capability
/// of the levels below it. Ownership is outside this ladder and grants
/// management capabilities no share level does.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    utoipa::ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// View and download the file.
    Read = 0,
    /// Read plus rename.
    Edit = 1,
    /// Edit plus removing one's own access.
    Delete = 2,
}

impl Permission {
    /// Convert permission to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Read => "read",
            Permission::Edit => "edit",
            Permission::Delete => "delete",
        }
    }

    /// Check whether this level includes the capabilities of `required`.
    pub fn allows(&self, required: Permission) -> bool {
        *self >= required
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "read" => Ok(Permission::Read),
            "edit" => Ok(Permission::Edit),
            "delete" => Ok(Permission::Delete),
            _ => Err(format!("unknown permission: {s}")),
        }
    }
}

// For #[sqlx(try_from = "String")] on model fields.
impl TryFrom<String> for Permission {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A share grant linking one file to one non-owner user.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Share {
    /// Unique share ID.
    pub id: i64,
    /// File this grant applies to.
    pub file_id: i64,
    /// User the file is shared with.
    pub grantee_id: i64,
    /// User who created the grant (the file owner).
    pub granter_id: i64,
    /// Granted permission level.
    #[sqlx(try_from = "String")]
    pub permission: Permission,
    /// When the grant was created.
    pub created_at: String,
    /// When the grant was last modified.
    pub updated_at: String,
}

/// A share grant joined with the grantee's display attributes.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ShareWithGrantee {
    /// Unique share ID.
    pub id: i64,
    /// File this grant applies to.
    pub file_id: i64,
    /// User the file is shared with.
    pub grantee_id: i64,
    /// Granted permission level.
    #[sqlx(try_from = "String")]
    pub permission: Permission,
    /// Grantee display name.
    pub grantee_name: String,
    /// Grantee email.
    pub grantee_email: String,
    /// Grantee profile image URL.
    pub grantee_picture: Option<String>,
    /// When the grant was created.
    pub created_at: String,
    /// When the grant was last modified.
    pub updated_at: String,
}

/// Data for creating or updating a share grant.
#[derive(Debug, Clone)]
pub struct NewShare {
    /// File to share.
    pub file_id: i64,
    /// User the file is shared with.
    pub grantee_id: i64,
    /// User creating the grant.
    pub granter_id: i64,
    /// Permission level.
    pub permission: Permission,
}
