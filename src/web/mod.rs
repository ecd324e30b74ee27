//! Web API for filedock.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::{ApiError, ErrorCode};
pub use server::WebServer;
