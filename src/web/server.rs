//! Web server for filedock.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::Config;
use crate::identity::{IdentityVerifier, JwtIdentityVerifier};
use crate::notify::SessionRegistry;
use crate::storage::{BlobStore, LocalBlobStore};
use crate::{Database, FiledockError, Result};

use super::handlers::AppState;
use super::middleware::JwtState;
use super::router::{create_health_router, create_router, create_swagger_router};

/// Web server for the API.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// JWT state.
    jwt_state: Arc<JwtState>,
    /// Allowed CORS origins.
    cors_origins: Vec<String>,
}

impl WebServer {
    /// Create a new web server from configuration.
    pub fn new(config: &Config, db: Database) -> Result<Self> {
        let blob_store = LocalBlobStore::new(&config.storage.path)?;
        let identity_verifier =
            JwtIdentityVerifier::new(&config.identity.secret, &config.identity.issuer);
        Self::with_components(config, db, Arc::new(blob_store), Arc::new(identity_verifier))
    }

    /// Create a new web server with explicit storage and identity backends.
    pub fn with_components(
        config: &Config,
        db: Database,
        blob_store: Arc<dyn BlobStore>,
        identity_verifier: Arc<dyn IdentityVerifier>,
    ) -> Result<Self> {
        let addr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| {
                FiledockError::Config(format!("invalid web server address: {e}"))
            })?;

        let jwt_state = Arc::new(JwtState::new(&config.auth.jwt_secret));

        let app_state = AppState {
            db: Arc::new(db),
            blob_store,
            sessions: Arc::new(SessionRegistry::new()),
            identity_verifier,
            jwt: jwt_state.clone(),
            access_token_expiry: config.auth.access_token_expiry_secs,
            download_url_ttl: config.auth.download_url_ttl_secs,
            max_upload_size: config.max_upload_size(),
        };

        Ok(Self {
            addr,
            app_state: Arc::new(app_state),
            jwt_state,
            cors_origins: config.server.cors_origins.clone(),
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn build_router(&self) -> axum::Router {
        create_router(
            self.app_state.clone(),
            self.jwt_state.clone(),
            &self.cors_origins,
        )
        .merge(create_health_router())
        .merge(create_swagger_router())
    }

    /// Run the web server.
    pub async fn run(self) -> Result<()> {
        let router = self.build_router();

        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        tracing::info!("Web server listening on http://{}", local_addr);

        axum::serve(listener, router).await?;
        Ok(())
    }

    /// Run the server in the background and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> Result<SocketAddr> {
        let router = self.build_router();

        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        tracing::info!("Web server listening on http://{}", local_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}
