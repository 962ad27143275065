//! Random value generation for token ids and signing secrets.

use rand::Rng;

/// Byte length of a generated signing secret (64 hex characters).
pub const SIGNING_SECRET_BYTES: usize = 32;

/// Byte length of a token id (32 hex characters).
pub const TOKEN_ID_BYTES: usize = 16;

/// Generate `len` cryptographically random bytes, hex-encoded (lowercase).
pub fn generate_random_hex(len: usize) -> String {
    let mut rng = rand::rng();
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes[..]);
    hex::encode(bytes)
}

/// Generate a fresh signing secret.
///
/// The value is not applied anywhere; the operator installs it as `JWT_SECRET`.
pub fn generate_signing_secret() -> String {
    generate_random_hex(SIGNING_SECRET_BYTES)
}

/// Generate a unique token identifier (`jti`).
pub fn generate_token_id() -> String {
    generate_random_hex(TOKEN_ID_BYTES)
}
