//! Admin credential document.
//!
//! Location: collection `admin`, document `creds`.
//! Fields:
//! - `username` - login name
//! - `password_hash` - argon2id PHC string
//! - `password` - legacy plaintext, removed whenever a new password is written

use super::{Document, DocumentStore, StoreError};
use serde_json::{Map, Value};

pub const ADMIN_COLLECTION: &str = "admin";
pub const ADMIN_DOCUMENT: &str = "creds";

pub const FIELD_USERNAME: &str = "username";
pub const FIELD_PASSWORD_HASH: &str = "password_hash";
pub const FIELD_LEGACY_PASSWORD: &str = "password";

/// Fields to merge into the admin document. `None` leaves a field untouched.
#[derive(Default)]
pub struct CredentialUpdate {
    pub username: Option<String>,
    pub password_hash: Option<String>,
}

impl CredentialUpdate {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.password_hash.is_none()
    }

    fn into_fields(self) -> Map<String, Value> {
        let mut fields = Map::new();
        if let Some(username) = self.username {
            fields.insert(FIELD_USERNAME.to_string(), Value::String(username));
        }
        if let Some(hash) = self.password_hash {
            fields.insert(FIELD_PASSWORD_HASH.to_string(), Value::String(hash));
            fields.insert(FIELD_LEGACY_PASSWORD.to_string(), Value::Null);
        }
        fields
    }
}

/// Read the admin credential document, if one has been written.
pub async fn get_admin_document(
    store: &dyn DocumentStore,
) -> Result<Option<Document>, StoreError> {
    store.get(ADMIN_COLLECTION, ADMIN_DOCUMENT).await
}

/// Merge an update into the admin credential document (upsert).
pub async fn update_admin_document(
    store: &dyn DocumentStore,
    update: CredentialUpdate,
) -> Result<(), StoreError> {
    if update.is_empty() {
        return Ok(());
    }
    store
        .merge(ADMIN_COLLECTION, ADMIN_DOCUMENT, update.into_fields())
        .await
}
