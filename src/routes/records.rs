//! Student and attendance read endpoints (all require AdminSession).

use crate::auth::middleware::{AdminSession, AppState};
use crate::error::AppError;
use crate::storage::{Direction, Document};
use axum::{extract::State, response::IntoResponse, Json};
use serde_json::Value;

pub const STUDENTS_COLLECTION: &str = "students";
pub const ATTENDANCE_COLLECTION: &str = "attendance_logs";
pub const ATTENDANCE_ORDER_FIELD: &str = "timestamp";

fn to_json(documents: Vec<Document>) -> Vec<Value> {
    documents.into_iter().map(Document::into_json).collect()
}

/// GET /api/students - List all student documents
pub async fn list_students(
    AdminSession(_session): AdminSession,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let students = state.store.list(STUDENTS_COLLECTION).await?;
    Ok(Json(to_json(students)))
}

/// GET /api/attendance - List attendance logs, newest first
pub async fn list_attendance(
    AdminSession(_session): AdminSession,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let logs = state
        .store
        .query_ordered(
            ATTENDANCE_COLLECTION,
            ATTENDANCE_ORDER_FIELD,
            Direction::Descending,
            state.config.attendance_page_size,
        )
        .await?;
    Ok(Json(to_json(logs)))
}
