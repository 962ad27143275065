//! Session token issuance and verification (JWT, HS256).
//!
//! Tokens are stateless: nothing is recorded server-side, so a token stays
//! valid until it expires or the signing secret changes.

use super::secret::generate_token_id;
use crate::error::AppError;
use crate::models::Role;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Clock skew tolerated when checking `exp`, in seconds.
const EXPIRY_LEEWAY_SECS: u64 = 5;

/// Claims carried by every session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub role: Role,
    /// Issued-at (seconds since epoch).
    pub iat: i64,
    /// Expiry (seconds since epoch).
    pub exp: i64,
    /// Random token id, 32 hex chars. Informational only.
    pub jti: String,
}

/// A freshly signed token together with its claims.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

/// Signs and verifies session tokens with a fixed secret.
///
/// The secret is set once at startup and never mutated.
#[derive(Clone)]
pub struct TokenIssuer {
    keys: Arc<Keys>,
    ttl_secs: i64,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = EXPIRY_LEEWAY_SECS;

        Self {
            keys: Arc::new(Keys {
                encoding: EncodingKey::from_secret(secret.as_bytes()),
                decoding: DecodingKey::from_secret(secret.as_bytes()),
                validation,
            }),
            ttl_secs: ttl_secs.min(i64::MAX as u64) as i64,
        }
    }

    /// Issue an admin token expiring `ttl_secs` from now.
    pub fn issue(&self) -> Result<IssuedToken, AppError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            role: Role::Admin,
            iat: now,
            exp: now.saturating_add(self.ttl_secs),
            jti: generate_token_id(),
        };
        let token = self.sign(&claims)?;
        Ok(IssuedToken { token, claims })
    }

    fn sign(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.keys.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to encode token: {}", e)))
    }

    /// Verify signature and expiry, returning the decoded claims.
    ///
    /// Every failure maps to `Forbidden`; the reason is only logged.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let data = decode::<Claims>(token, &self.keys.decoding, &self.keys.validation).map_err(
            |e| {
                let reason = match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => "expired",
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => "bad_signature",
                    jsonwebtoken::errors::ErrorKind::InvalidToken => "malformed",
                    _ => "invalid",
                };
                tracing::debug!(action = "token_rejected", reason, "Token verification failed");
                AppError::invalid_token()
            },
        )?;

        Ok(data.claims)
    }
}
