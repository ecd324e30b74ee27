//! Configuration module for filedock.

use serde::Deserialize;
use std::path::Path;

use crate::{FiledockError, Result};

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origins. Empty means permissive (development mode).
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/filedock.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Blob storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the blob storage directory.
    #[serde(default = "default_storage_path")]
    pub path: String,
    /// Maximum upload size in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
}

fn default_storage_path() -> String {
    "data/blobs".to_string()
}

fn default_max_upload_size() -> u64 {
    100
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
            max_upload_size_mb: default_max_upload_size(),
        }
    }
}

/// Access token configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Secret key for signing access tokens and download URLs.
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Access token expiry in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
    /// Signed download URL time-to-live in seconds.
    #[serde(default = "default_download_url_ttl")]
    pub download_url_ttl_secs: u64,
}

fn default_jwt_secret() -> String {
    "change-me-in-production".to_string()
}

fn default_access_token_expiry() -> u64 {
    3600
}

fn default_download_url_ttl() -> u64 {
    3600
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            access_token_expiry_secs: default_access_token_expiry(),
            download_url_ttl_secs: default_download_url_ttl(),
        }
    }
}

/// Identity provider configuration.
///
/// The server consumes signed identity tokens from an external provider;
/// the provider handshake itself happens outside this process.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    /// Shared secret used to verify provider-issued identity tokens.
    #[serde(default = "default_identity_secret")]
    pub secret: String,
    /// Expected `iss` claim on identity tokens.
    #[serde(default = "default_identity_issuer")]
    pub issuer: String,
}

fn default_identity_secret() -> String {
    "identity-dev-secret".to_string()
}

fn default_identity_issuer() -> String {
    "https://identity.example.com".to_string()
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            secret: default_identity_secret(),
            issuer: default_identity_issuer(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/filedock.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Blob storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Access token settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Identity provider settings.
    #[serde(default)]
    pub identity: IdentityConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        toml::from_str(&content).map_err(|e| FiledockError::Config(e.to_string()))
    }

    /// Maximum upload size in bytes.
    pub fn max_upload_size(&self) -> u64 {
        self.storage.max_upload_size_mb * 1024 * 1024
    }
}
