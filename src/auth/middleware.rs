//! Axum extractors for authentication.

use super::token::{Claims, TokenIssuer};
use crate::config::Config;
use crate::error::AppError;
use crate::models::Role;
use crate::storage::DocumentStore;
use axum::{extract::FromRequestParts, http::request::Parts};
use std::sync::Arc;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub tokens: TokenIssuer,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, config: Config) -> Self {
        let tokens = TokenIssuer::new(&config.jwt_secret, config.token_ttl_secs);
        Self {
            store,
            tokens,
            config: Arc::new(config),
        }
    }
}

/// Admin session extractor.
///
/// Reads `Authorization: Bearer {token}` and verifies the token.
/// Returns 401 if the header is missing, 403 if it is malformed or the
/// token does not verify.
pub struct AdminSession(pub Claims);

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .ok_or_else(AppError::no_token)?;

        // Anything that is not a well-formed bearer header is treated like a bad token
        let token = auth_header
            .to_str()
            .ok()
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(AppError::invalid_token)?;

        let claims = state.tokens.verify(token)?;

        if claims.role != Role::Admin {
            return Err(AppError::invalid_token());
        }

        Ok(AdminSession(claims))
    }
}
