//! Auth API endpoints.

use crate::auth::credentials::{resolve_admin_credential, verify_credentials};
use crate::auth::middleware::AppState;
use crate::error::AppError;
use crate::models::{LoginRequest, LoginResponse};
use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    Json,
};

/// POST /api/admin/login - Verify admin credentials and issue a session token
///
/// A body that cannot be read as a login request is answered like a wrong password.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            tracing::warn!(
                action = "login_failed",
                reason = %rejection.body_text(),
                "Unreadable login request"
            );
            return Err(AppError::invalid_credentials());
        }
    };

    let credential = resolve_admin_credential(state.store.as_ref(), &state.config).await;

    if !verify_credentials(&credential, &req.username, &req.password)? {
        tracing::warn!(action = "login_failed", username = %req.username, "Invalid admin credentials");
        return Err(AppError::invalid_credentials());
    }

    let issued = state.tokens.issue()?;

    tracing::info!(
        action = "login_success",
        jti = %issued.claims.jti,
        role = %issued.claims.role,
        exp = issued.claims.exp,
        "Admin authenticated"
    );

    Ok(Json(LoginResponse {
        token: issued.token,
        jti: issued.claims.jti,
    }))
}
