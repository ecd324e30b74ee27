//! HTTP middleware.

pub mod auth;
pub mod cors;

pub use auth::{jwt_auth, AuthUser, DownloadClaims, JwtClaims, JwtState};
pub use cors::create_cors_layer;
