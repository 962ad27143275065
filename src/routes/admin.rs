//! Admin API endpoints (all require AdminSession).

use crate::auth::credentials::hash_password;
use crate::auth::middleware::{AdminSession, AppState};
use crate::auth::secret::generate_signing_secret;
use crate::error::AppError;
use crate::models::{
    ChangeCredentialsRequest, ChangeCredentialsResponse, ChangeValueRequest,
    GenerateSecretResponse, SuccessResponse,
};
use crate::storage::admin::{update_admin_document, CredentialUpdate};
use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    Json,
};

/// Treat empty strings the same as an absent field.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// POST /api/admin/change-credentials - Change username and/or password
pub async fn change_credentials(
    AdminSession(session): AdminSession,
    State(state): State<AppState>,
    payload: Result<Json<ChangeCredentialsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload?;
    let new_username = non_empty(req.new_username);
    let new_password = non_empty(req.new_password);

    if new_username.is_none() && new_password.is_none() {
        return Err(AppError::BadRequest(
            "Provide newUsername or newPassword".to_string(),
        ));
    }

    let changed_username = new_username.is_some();
    let changed_password = new_password.is_some();

    let update = CredentialUpdate {
        username: new_username,
        password_hash: new_password.as_deref().map(hash_password).transpose()?,
    };
    update_admin_document(state.store.as_ref(), update).await?;

    tracing::info!(
        action = "credentials_changed",
        jti = %session.jti,
        username = changed_username,
        password = changed_password,
        "Admin credentials updated"
    );

    Ok(Json(ChangeCredentialsResponse {
        ok: true,
        message: "Admin credentials updated".to_string(),
    }))
}

/// POST /api/admin/change-username - Replace the admin username
pub async fn change_username(
    AdminSession(session): AdminSession,
    State(state): State<AppState>,
    payload: Result<Json<ChangeValueRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload?;
    let username = non_empty(req.value)
        .ok_or_else(|| AppError::BadRequest("value is required".to_string()))?;

    update_admin_document(
        state.store.as_ref(),
        CredentialUpdate {
            username: Some(username),
            ..Default::default()
        },
    )
    .await?;

    tracing::info!(action = "username_changed", jti = %session.jti, "Admin username updated");

    Ok(Json(SuccessResponse { success: true }))
}

/// POST /api/admin/change-password - Replace the admin password
///
/// Stored as an Argon2id hash; any legacy plaintext copy is removed.
pub async fn change_password(
    AdminSession(session): AdminSession,
    State(state): State<AppState>,
    payload: Result<Json<ChangeValueRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload?;
    let password = non_empty(req.value)
        .ok_or_else(|| AppError::BadRequest("value is required".to_string()))?;

    update_admin_document(
        state.store.as_ref(),
        CredentialUpdate {
            password_hash: Some(hash_password(&password)?),
            ..Default::default()
        },
    )
    .await?;

    tracing::info!(action = "password_changed", jti = %session.jti, "Admin password updated");

    Ok(Json(SuccessResponse { success: true }))
}

/// POST /api/admin/generate-secret - Generate a candidate signing secret
///
/// The running process keeps its current secret. Installing the returned
/// value as JWT_SECRET invalidates every outstanding token.
pub async fn generate_secret(AdminSession(session): AdminSession) -> impl IntoResponse {
    let new_secret = generate_signing_secret();

    tracing::info!(action = "secret_generated", jti = %session.jti, "Signing secret generated");

    Json(GenerateSecretResponse { new_secret })
}
