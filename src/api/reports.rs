//! Free-text employee report endpoints. Reports list newest-first.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{DbPool, EmployeeReportPayload, EmployeeReportResponse};
use crate::AppState;

use super::auth::AuthUser;
use super::error::ApiError;
use super::validation;

#[derive(Debug, Deserialize)]
pub struct ReportQueryParams {
    pub employee_id: Option<String>,
}

const REPORT_SELECT: &str =
    "SELECT r.*, e.first_name || ' ' || e.last_name AS employee_full_name
     FROM employee_reports r
     INNER JOIN employees e ON e.id = r.employee_id";

async fn fetch_report(pool: &DbPool, id: &str) -> Result<EmployeeReportResponse, ApiError> {
    let report: Option<EmployeeReportResponse> =
        sqlx::query_as(&format!("{} WHERE r.id = ?", REPORT_SELECT))
            .bind(id)
            .fetch_optional(pool)
            .await?;
    report.ok_or_else(|| ApiError::not_found("Report not found"))
}

/// List reports, optionally for one employee, newest first
///
/// GET /api/reports?employee_id=
pub async fn list_reports(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReportQueryParams>,
    _user: AuthUser,
) -> Result<Json<Vec<EmployeeReportResponse>>, ApiError> {
    let reports: Vec<EmployeeReportResponse> = match params.employee_id {
        Some(ref employee_id) => {
            sqlx::query_as(&format!(
                "{} WHERE r.employee_id = ? ORDER BY r.timestamp DESC",
                REPORT_SELECT
            ))
            .bind(employee_id)
            .fetch_all(&state.db)
            .await?
        }
        None => {
            sqlx::query_as(&format!("{} ORDER BY r.timestamp DESC", REPORT_SELECT))
                .fetch_all(&state.db)
                .await?
        }
    };
    Ok(Json(reports))
}

/// Create a report
///
/// POST /api/reports
pub async fn create_report(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Json(payload): Json<EmployeeReportPayload>,
) -> Result<(StatusCode, Json<EmployeeReportResponse>), ApiError> {
    validation::validate_required(&payload.content, "Report content")
        .map_err(|e| ApiError::validation_field("content", e))?;

    let id = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO employee_reports (id, employee_id, timestamp, content) VALUES (?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&payload.employee_id)
    .bind(chrono::Utc::now().to_rfc3339())
    .bind(&payload.content)
    .execute(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(fetch_report(&state.db, &id).await?)))
}

/// Get a report
///
/// GET /api/reports/:id
pub async fn get_report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    _user: AuthUser,
) -> Result<Json<EmployeeReportResponse>, ApiError> {
    Ok(Json(fetch_report(&state.db, &id).await?))
}

/// Replace a report's content. The creation timestamp never changes.
///
/// PUT /api/reports/:id
pub async fn update_report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    _user: AuthUser,
    Json(payload): Json<EmployeeReportPayload>,
) -> Result<Json<EmployeeReportResponse>, ApiError> {
    validation::validate_required(&payload.content, "Report content")
        .map_err(|e| ApiError::validation_field("content", e))?;

    let result = sqlx::query("UPDATE employee_reports SET employee_id = ?, content = ? WHERE id = ?")
        .bind(&payload.employee_id)
        .bind(&payload.content)
        .bind(&id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Report not found"));
    }

    Ok(Json(fetch_report(&state.db, &id).await?))
}

/// Delete a report
///
/// DELETE /api/reports/:id
pub async fn delete_report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    _user: AuthUser,
) -> Result<StatusCode, ApiError> {
    let result = sqlx::query("DELETE FROM employee_reports WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Report not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
