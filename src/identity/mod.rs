//! Identity resolution for filedock.
//!
//! The actual identity-provider handshake (OAuth redirect, consent, etc.)
//! happens outside this server. What arrives here is a signed identity
//! token; this module verifies it and extracts the claims the rest of the
//! system consumes.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::{FiledockError, Result};

/// Verified identity claims consumed by the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityClaims {
    /// Stable provider-scoped subject identifier.
    pub subject: String,
    /// Email address.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Profile image URL (optional).
    pub picture: Option<String>,
}

/// Verifies an inbound identity token and produces claims.
pub trait IdentityVerifier: Send + Sync {
    /// Verify a raw identity token.
    ///
    /// Returns `FiledockError::Auth` for expired, malformed, or
    /// wrongly-issued tokens.
    fn verify(&self, token: &str) -> Result<IdentityClaims>;
}

/// Raw JWT claims as issued by the identity provider.
#[derive(Debug, Deserialize)]
struct ProviderClaims {
    sub: String,
    email: String,
    name: String,
    #[serde(default)]
    picture: Option<String>,
    #[allow(dead_code)]
    exp: u64,
}

/// JWT-based identity verifier (HS256 shared secret).
pub struct JwtIdentityVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityVerifier {
    /// Create a verifier for tokens signed with `secret` and issued by `issuer`.
    pub fn new(secret: &str, issuer: &str) -> Self {
        let decoding_key = DecodingKey::from_secret(secret.as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_issuer(&[issuer]);

        Self {
            decoding_key,
            validation,
        }
    }
}

impl IdentityVerifier for JwtIdentityVerifier {
    fn verify(&self, token: &str) -> Result<IdentityClaims> {
        let token_data = decode::<ProviderClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!("Identity token verification failed: {}", e);
                FiledockError::Auth("invalid identity token".to_string())
            })?;

        let claims = token_data.claims;
        Ok(IdentityClaims {
            subject: claims.sub,
            email: claims.email,
            name: claims.name,
            picture: claims.picture,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    #[derive(Serialize)]
    struct TestClaims<'a> {
        sub: &'a str,
        email: &'a str,
        name: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        picture: Option<&'a str>,
        iss: &'a str,
        exp: u64,
    }

    fn sign(secret: &str, claims: &TestClaims) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn future_exp() -> u64 {
        (chrono::Utc::now().timestamp() + 3600) as u64
    }

    #[test]
    fn test_verify_valid_token() {
        let verifier = JwtIdentityVerifier::new("secret", "https://idp.test");
        let token = sign(
            "secret",
            &TestClaims {
                sub: "idp-1",
                email: "alice@example.com",
                name: "Alice",
                picture: Some("http://img/a.png"),
                iss: "https://idp.test",
                exp: future_exp(),
            },
        );

        let claims = verifier.verify(&token).unwrap();
        assert_eq!(claims.subject, "idp-1");
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.picture.as_deref(), Some("http://img/a.png"));
    }

    #[test]
    fn test_verify_rejects_wrong_issuer() {
        let verifier = JwtIdentityVerifier::new("secret", "https://idp.test");
        let token = sign(
            "secret",
            &TestClaims {
                sub: "idp-1",
                email: "alice@example.com",
                name: "Alice",
                picture: None,
                iss: "https://evil.test",
                exp: future_exp(),
            },
        );

        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let verifier = JwtIdentityVerifier::new("secret", "https://idp.test");
        let token = sign(
            "other-secret",
            &TestClaims {
                sub: "idp-1",
                email: "alice@example.com",
                name: "Alice",
                picture: None,
                iss: "https://idp.test",
                exp: future_exp(),
            },
        );

        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        let verifier = JwtIdentityVerifier::new("secret", "https://idp.test");
        let token = sign(
            "secret",
            &TestClaims {
                sub: "idp-1",
                email: "alice@example.com",
                name: "Alice",
                picture: None,
                iss: "https://idp.test",
                exp: (chrono::Utc::now().timestamp() - 3600) as u64,
            },
        );

        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let verifier = JwtIdentityVerifier::new("secret", "https://idp.test");
        assert!(verifier.verify("not-a-jwt").is_err());
    }
}
