//! Request and response models for the API.
//!
//! All models use serde for serialization/deserialization.

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

// ============================================================================
// Auth Models
// ============================================================================

/// Login request. Absent fields deserialize as empty strings and fail the
/// credential check like any other mismatch.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Issued session token plus its identifier.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub jti: String,
}

// ============================================================================
// Admin Models
// ============================================================================

/// Combined credential change. At least one field must be non-empty.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeCredentialsRequest {
    pub new_username: Option<String>,
    pub new_password: Option<String>,
}

/// Single-field credential change.
#[derive(Debug, Default, Deserialize)]
pub struct ChangeValueRequest {
    pub value: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChangeCredentialsResponse {
    pub ok: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateSecretResponse {
    pub new_secret: String,
}

// ============================================================================
// Credentials
// ============================================================================

/// How the admin password is held by its source.
#[derive(Clone)]
pub enum PasswordSecret {
    /// Argon2 PHC string.
    Hash(String),
    /// Legacy stored value or configuration fallback.
    Plain(Zeroizing<String>),
}

/// The admin credential currently in effect.
#[derive(Clone)]
pub struct AdminCredential {
    pub username: String,
    pub password: PasswordSecret,
}

impl std::fmt::Debug for AdminCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let password = match self.password {
            PasswordSecret::Hash(_) => "[HASH]",
            PasswordSecret::Plain(_) => "[REDACTED]",
        };
        f.debug_struct("AdminCredential")
            .field("username", &self.username)
            .field("password", &password)
            .finish()
    }
}

// ============================================================================
// Roles
// ============================================================================

/// Principal role carried in the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
