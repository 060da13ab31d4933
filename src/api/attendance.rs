//! Attendance-history endpoints: the raw record collection behind the
//! check-in/check-out operations.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::DateTime;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{AttendanceRecord, AttendanceRecordPayload, AttendanceRecordResponse, DbPool};
use crate::AppState;

use super::auth::AuthUser;
use super::error::{ApiError, ValidationErrorBuilder};

#[derive(Debug, Deserialize)]
pub struct AttendanceQueryParams {
    pub employee_id: Option<String>,
    pub date: Option<String>,
}

const RECORD_SELECT: &str =
    "SELECT a.*, e.first_name || ' ' || e.last_name AS employee_full_name
     FROM attendance_records a
     INNER JOIN employees e ON e.id = a.employee_id";

/// Parse the payload timestamps, returning (check_in, check_out, date).
fn validate_payload(
    payload: &AttendanceRecordPayload,
) -> Result<(String, Option<String>, String), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    let check_in = DateTime::parse_from_rfc3339(&payload.check_in_time);
    if check_in.is_err() {
        errors.add("check_in_time", "Must be an RFC 3339 timestamp");
    }

    let check_out = match payload.check_out_time.as_deref() {
        Some(raw) => match DateTime::parse_from_rfc3339(raw) {
            Ok(t) => Some(t),
            Err(_) => {
                errors.add("check_out_time", "Must be an RFC 3339 timestamp");
                None
            }
        },
        None => None,
    };

    errors.finish()?;

    let check_in = check_in.expect("validated above");
    Ok((
        check_in.to_rfc3339(),
        check_out.map(|t| t.to_rfc3339()),
        check_in.date_naive().to_string(),
    ))
}

/// List attendance records, optionally filtered by employee and date
///
/// GET /api/attendance-history?employee_id=&date=
pub async fn list_records(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AttendanceQueryParams>,
    _user: AuthUser,
) -> Result<Json<Vec<AttendanceRecordResponse>>, ApiError> {
    let mut sql = format!("{} WHERE 1=1", RECORD_SELECT);
    if params.employee_id.is_some() {
        sql.push_str(" AND a.employee_id = ?");
    }
    if params.date.is_some() {
        sql.push_str(" AND a.date = ?");
    }
    sql.push_str(" ORDER BY a.check_in_time DESC");

    let mut query = sqlx::query_as(&sql);
    if let Some(ref employee_id) = params.employee_id {
        query = query.bind(employee_id);
    }
    if let Some(ref date) = params.date {
        query = query.bind(date);
    }

    let records: Vec<AttendanceRecordResponse> = query.fetch_all(&state.db).await?;
    Ok(Json(records))
}

async fn fetch_record(pool: &DbPool, id: &str) -> Result<AttendanceRecordResponse, ApiError> {
    let record: Option<AttendanceRecordResponse> =
        sqlx::query_as(&format!("{} WHERE a.id = ?", RECORD_SELECT))
            .bind(id)
            .fetch_optional(pool)
            .await?;
    record.ok_or_else(|| ApiError::not_found("Attendance record not found"))
}

/// Create an attendance record directly (back-office corrections)
///
/// POST /api/attendance-history
pub async fn create_record(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Json(payload): Json<AttendanceRecordPayload>,
) -> Result<(StatusCode, Json<AttendanceRecordResponse>), ApiError> {
    let (check_in_time, check_out_time, date) = validate_payload(&payload)?;

    let id = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO attendance_records (id, employee_id, check_in_time, check_out_time, date)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&payload.employee_id)
    .bind(&check_in_time)
    .bind(&check_out_time)
    .bind(&date)
    .execute(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(fetch_record(&state.db, &id).await?)))
}

/// Get an attendance record
///
/// GET /api/attendance-history/:id
pub async fn get_record(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    _user: AuthUser,
) -> Result<Json<AttendanceRecordResponse>, ApiError> {
    Ok(Json(fetch_record(&state.db, &id).await?))
}

/// Replace an attendance record's timestamps. The date stays as fixed
/// at creation.
///
/// PUT /api/attendance-history/:id
pub async fn update_record(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    _user: AuthUser,
    Json(payload): Json<AttendanceRecordPayload>,
) -> Result<Json<AttendanceRecordResponse>, ApiError> {
    let (check_in_time, check_out_time, _date) = validate_payload(&payload)?;

    let existing: Option<AttendanceRecord> =
        sqlx::query_as("SELECT * FROM attendance_records WHERE id = ?")
            .bind(&id)
            .fetch_optional(&state.db)
            .await?;
    if existing.is_none() {
        return Err(ApiError::not_found("Attendance record not found"));
    }

    sqlx::query(
        "UPDATE attendance_records
         SET employee_id = ?, check_in_time = ?, check_out_time = ?
         WHERE id = ?",
    )
    .bind(&payload.employee_id)
    .bind(&check_in_time)
    .bind(&check_out_time)
    .bind(&id)
    .execute(&state.db)
    .await?;

    Ok(Json(fetch_record(&state.db, &id).await?))
}

/// Delete an attendance record
///
/// DELETE /api/attendance-history/:id
pub async fn delete_record(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    _user: AuthUser,
) -> Result<StatusCode, ApiError> {
    let result = sqlx::query("DELETE FROM attendance_records WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Attendance record not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
