//! filedock - multi-user file storage and sharing service
//!
//! A web service for uploading files, sharing them with graded
//! permissions, and keeping a trash with restore.

pub mod config;
pub mod datetime;
pub mod db;
pub mod error;
pub mod file;
pub mod identity;
pub mod logging;
pub mod notify;
pub mod share;
pub mod storage;
pub mod web;

pub use config::Config;
pub use db::{Database, NewUser, User, UserRepository};
pub use error::{FiledockError, Result};
pub use file::{DeleteOutcome, FileRecord, FileRepository, FileService, NewFile, UploadRequest};
pub use identity::{IdentityClaims, IdentityVerifier, JwtIdentityVerifier};
pub use notify::{Event, SessionRegistry};
pub use share::{NewShare, Permission, Share, ShareRepository};
pub use storage::{BlobStore, LocalBlobStore};
pub use web::WebServer;
