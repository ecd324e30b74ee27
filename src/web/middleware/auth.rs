//! JWT authentication middleware.

use axum::{
    body::Body,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, Request},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::web::error::ApiError;
use crate::{FiledockError, Result};

/// JWT claims structure for access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID).
    pub sub: i64,
    /// Email address.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Issued at timestamp.
    pub iat: u64,
    /// Expiration timestamp.
    pub exp: u64,
    /// JWT ID (unique identifier).
    pub jti: String,
}

/// Claims for a short-lived signed download link.
///
/// Bound to one file so a leaked link grants nothing else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadClaims {
    /// Subject (user ID).
    pub sub: i64,
    /// File the link is valid for.
    pub file_id: i64,
    /// Expiration timestamp.
    pub exp: u64,
}

/// Application state for JWT authentication.
#[derive(Clone)]
pub struct JwtState {
    /// Decoding key for JWT verification.
    pub decoding_key: DecodingKey,
    /// Encoding key for token issuance.
    pub encoding_key: EncodingKey,
    /// Validation settings.
    pub validation: Validation,
}

impl JwtState {
    /// Create a new JWT state from a secret key.
    pub fn new(secret: &str) -> Self {
        let decoding_key = DecodingKey::from_secret(secret.as_bytes());
        let encoding_key = EncodingKey::from_secret(secret.as_bytes());
        let mut validation = Validation::default();
        validation.validate_exp = true;

        Self {
            decoding_key,
            encoding_key,
            validation,
        }
    }

    /// Issue an access token for a user.
    pub fn issue_access_token(
        &self,
        user_id: i64,
        email: &str,
        name: &str,
        expiry_secs: u64,
    ) -> Result<String> {
        let now = chrono::Utc::now().timestamp() as u64;
        let claims = JwtClaims {
            sub: user_id,
            email: email.to_string(),
            name: name.to_string(),
            iat: now,
            exp: now + expiry_secs,
            jti: uuid::Uuid::new_v4().to_string(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| FiledockError::Auth(format!("failed to issue token: {e}")))
    }

    /// Issue a signed single-file download token.
    pub fn issue_download_token(&self, user_id: i64, file_id: i64, ttl_secs: u64) -> Result<String> {
        let claims = DownloadClaims {
            sub: user_id,
            file_id,
            exp: chrono::Utc::now().timestamp() as u64 + ttl_secs,
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| FiledockError::Auth(format!("failed to issue token: {e}")))
    }

    /// Verify a download token for a specific file.
    pub fn verify_download_token(&self, token: &str, file_id: i64) -> Result<DownloadClaims> {
        let data = decode::<DownloadClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| FiledockError::Auth("invalid or expired download token".to_string()))?;
        if data.claims.file_id != file_id {
            return Err(FiledockError::Auth(
                "download token does not match this file".to_string(),
            ));
        }
        Ok(data.claims)
    }
}

/// Extractor for authenticated users.
///
/// Use this extractor to require authentication for a handler.
/// The handler will receive the JWT claims if the token is valid.
#[derive(Debug, Clone)]
pub struct AuthUser(pub JwtClaims);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = std::result::Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            // Try to get token from Authorization header first
            let token = if let Some(auth_header) = parts
                .headers
                .get(AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
            {
                auth_header.strip_prefix("Bearer ").map(|t| t.to_string())
            } else {
                None
            };

            // If no header token, try query parameter (WebSocket clients
            // cannot set headers from the browser)
            let token = match token {
                Some(t) => t,
                None => {
                    let query = parts.uri.query().unwrap_or("");
                    query
                        .split('&')
                        .find_map(|pair| {
                            let mut parts = pair.splitn(2, '=');
                            let key = parts.next()?;
                            let value = parts.next()?;
                            if key == "token" {
                                urlencoding::decode(value).ok().map(|s| s.into_owned())
                            } else {
                                None
                            }
                        })
                        .ok_or_else(|| ApiError::unauthorized("Missing authorization"))?
                }
            };

            // Get JWT state from extensions (set by middleware)
            let jwt_state = parts
                .extensions
                .get::<Arc<JwtState>>()
                .ok_or_else(|| ApiError::internal("JWT state not configured"))?;

            // Decode and validate the token
            let token_data =
                decode::<JwtClaims>(&token, &jwt_state.decoding_key, &jwt_state.validation)
                    .map_err(|e| {
                        tracing::debug!("JWT validation failed: {}", e);
                        ApiError::unauthorized("Invalid or expired token")
                    })?;

            Ok(AuthUser(token_data.claims))
        })
    }
}

/// Middleware function to inject JWT state into request extensions.
pub async fn jwt_auth(
    jwt_state: Arc<JwtState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    request.extensions_mut().insert(jwt_state);
    next.run(request).await
}
