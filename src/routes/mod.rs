//! API route handlers.

pub mod admin;
pub mod auth;
pub mod records;

use crate::auth::middleware::AppState;
use axum::{routing::get, routing::post, Router};

/// Build the API router with all endpoints.
pub fn api_router() -> Router<AppState> {
    Router::new()
        // Auth endpoints
        .route("/api/admin/login", post(auth::login))
        .route("/api/login", post(auth::login))
        // Admin endpoints
        .route(
            "/api/admin/change-credentials",
            post(admin::change_credentials),
        )
        .route("/api/admin/change-username", post(admin::change_username))
        .route("/api/admin/change-password", post(admin::change_password))
        .route("/api/admin/generate-secret", post(admin::generate_secret))
        // Record endpoints
        .route("/api/students", get(records::list_students))
        .route("/api/attendance", get(records::list_attendance))
}
