//! File lifecycle: metadata, upload/download service and trash handling.

mod metadata;
mod service;

pub use metadata::{FileRecord, FileRepository, NewFile};
pub use service::{DeleteOutcome, DownloadResult, FileService, UploadRequest};

/// Maximum filename length in characters.
pub const MAX_FILENAME_LENGTH: usize = 255;
