//! Authentication layer: credential checks, session tokens, and extractors.

pub mod credentials;
pub mod middleware;
pub mod secret;
pub mod token;

pub use credentials::{hash_password, resolve_admin_credential, verify_credentials};
pub use middleware::{AdminSession, AppState};
pub use secret::{generate_signing_secret, generate_token_id};
pub use token::{Claims, IssuedToken, TokenIssuer};
