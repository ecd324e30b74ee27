//! Share registry for filedock.
//!
//! Owns per-user, per-file permission grants and the authorization
//! predicates evaluated against them.

pub mod access;
mod model;
mod repository;

pub use model::{NewShare, Permission, Share, ShareWithGrantee};
pub use repository::{SharedFile, ShareRepository};
