//! Notification events pushed to connected clients.

use serde::{Deserialize, Serialize};

use crate::share::Permission;

/// An event delivered to a user's live sessions.
///
/// Serialized as JSON with a `type` tag, matching the messages the web
/// client listens for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Event {
    /// A file was shared with the recipient.
    FileShared {
        file_id: i64,
        file_name: String,
        shared_by: String,
        permission: Permission,
    },
    /// A file the recipient could see was deleted.
    FileDeleted { file_id: i64, file_name: String },
    /// A file the recipient could see was renamed.
    FileRenamed {
        file_id: i64,
        old_name: String,
        new_name: String,
    },
    /// The recipient's access to a file was revoked.
    ShareRevoked { file_id: i64, file_name: String },
}
