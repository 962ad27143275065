//! Admin credential resolution and verification.
//!
//! The admin document in the store takes precedence field by field; anything
//! it lacks (or the whole record, when the document is absent or unreadable)
//! comes from configuration. A stored hash that cannot be parsed also falls
//! back to the configured password.

use crate::config::Config;
use crate::error::AppError;
use crate::models::{AdminCredential, PasswordSecret};
use crate::storage::admin::{
    get_admin_document, FIELD_LEGACY_PASSWORD, FIELD_PASSWORD_HASH, FIELD_USERNAME,
};
use crate::storage::DocumentStore;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use subtle::{Choice, ConstantTimeEq};
use zeroize::Zeroizing;

/// Resolve the admin credential currently in effect.
///
/// Store read failures are logged and treated like an absent document.
pub async fn resolve_admin_credential(
    store: &dyn DocumentStore,
    config: &Config,
) -> AdminCredential {
    let fallback_password =
        || PasswordSecret::Plain(Zeroizing::new(config.admin_password.clone()));

    let document = match get_admin_document(store).await {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!(
                action = "credential_fallback",
                error = %e,
                "Failed to read admin credentials, using configured values"
            );
            None
        }
    };

    let Some(document) = document else {
        return AdminCredential {
            username: config.admin_username.clone(),
            password: fallback_password(),
        };
    };

    let username = document
        .str_field(FIELD_USERNAME)
        .filter(|u| !u.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| config.admin_username.clone());

    let stored_hash = document.str_field(FIELD_PASSWORD_HASH).filter(|hash| {
        let usable = PasswordHash::new(hash).is_ok();
        if !usable {
            tracing::warn!(
                action = "credential_fallback",
                field = FIELD_PASSWORD_HASH,
                "Stored password hash is not a PHC string, using configured password"
            );
        }
        usable
    });

    let password = if let Some(hash) = stored_hash {
        PasswordSecret::Hash(hash.to_string())
    } else if document.fields.contains_key(FIELD_PASSWORD_HASH) {
        fallback_password()
    } else if let Some(plain) = document.str_field(FIELD_LEGACY_PASSWORD) {
        PasswordSecret::Plain(Zeroizing::new(plain.to_string()))
    } else {
        fallback_password()
    };

    AdminCredential { username, password }
}

/// Check a login attempt against a resolved credential.
///
/// Both the username and password checks always run; comparisons are constant-time.
pub fn verify_credentials(
    credential: &AdminCredential,
    username: &str,
    password: &str,
) -> Result<bool, AppError> {
    let username_ok = username.as_bytes().ct_eq(credential.username.as_bytes());

    let password_ok = match &credential.password {
        PasswordSecret::Plain(expected) => password.as_bytes().ct_eq(expected.as_bytes()),
        PasswordSecret::Hash(hash) => Choice::from(verify_password_hash(password, hash)? as u8),
    };

    Ok((username_ok & password_ok).into())
}

/// Hash a password with Argon2id and a random salt, returning the PHC string.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let mut salt_bytes = [0u8; 16];
    rand::fill(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| AppError::Internal(format!("Salt encoding failed: {}", e)))?;

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

    Ok(hash.to_string())
}

fn verify_password_hash(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Invalid password hash format: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AppError::Internal(format!(
            "Password verification failed: {}",
            e
        ))),
    }
}
