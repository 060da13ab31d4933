//! Leave request endpoints: scoped listing, creation with date
//! validation, and the approve/reject workflow.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{DbPool, Leave, LeaveDecisionResponse, LeavePayload, LeaveResponse, LeaveStatus};
use crate::AppState;

use super::access::{self, caps, require_cap};
use super::auth::AuthUser;
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation;

const LEAVE_SELECT: &str =
    "SELECT l.*, e.first_name || ' ' || e.last_name AS employee_full_name, u.username AS approved_by_username
     FROM leaves l
     INNER JOIN employees e ON e.id = l.employee_id
     LEFT JOIN users u ON u.id = l.approved_by";

/// Validate the payload dates and reason against the creation moment.
fn validate_payload(payload: &LeavePayload, today: NaiveDate) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    let start = match validation::parse_date(&payload.start_date, "Start date") {
        Ok(d) => Some(d),
        Err(e) => {
            errors.add("start_date", e);
            None
        }
    };
    let end = match validation::parse_date(&payload.end_date, "End date") {
        Ok(d) => Some(d),
        Err(e) => {
            errors.add("end_date", e);
            None
        }
    };

    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            errors.add("end_date", "End date cannot precede the start date");
        }
        if start < today {
            errors.add("start_date", "A leave request cannot start in the past");
        }
    }

    if let Err(e) = validation::validate_reason(&payload.reason) {
        errors.add("reason", e);
    }

    errors.finish()
}

/// The caller's own employee id, for scoping. None when no profile is
/// linked.
async fn own_employee(pool: &DbPool, user: &AuthUser) -> Result<Option<String>, ApiError> {
    access::employee_id_for(pool, &user.user.id).await
}

/// Fetch a leave the caller is allowed to see; out-of-scope rows are
/// indistinguishable from missing ones.
async fn fetch_scoped(pool: &DbPool, user: &AuthUser, id: &str) -> Result<LeaveResponse, ApiError> {
    let leave: Option<LeaveResponse> = sqlx::query_as(&format!("{} WHERE l.id = ?", LEAVE_SELECT))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    let leave = leave.ok_or_else(|| ApiError::not_found("Leave not found"))?;

    if !access::can_view_all_leaves(user) {
        let own = own_employee(pool, user).await?;
        if own.as_deref() != Some(leave.employee_id.as_str()) {
            return Err(ApiError::not_found("Leave not found"));
        }
    }
    Ok(leave)
}

/// List leaves visible to the caller, most recent start date first
///
/// GET /api/leaves
pub async fn list_leaves(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Vec<LeaveResponse>>, ApiError> {
    let leaves: Vec<LeaveResponse> = if access::can_view_all_leaves(&user) {
        sqlx::query_as(&format!("{} ORDER BY l.start_date DESC", LEAVE_SELECT))
            .fetch_all(&state.db)
            .await?
    } else {
        match own_employee(&state.db, &user).await? {
            Some(employee_id) => {
                sqlx::query_as(&format!(
                    "{} WHERE l.employee_id = ? ORDER BY l.start_date DESC",
                    LEAVE_SELECT
                ))
                .bind(&employee_id)
                .fetch_all(&state.db)
                .await?
            }
            None => Vec::new(),
        }
    };
    Ok(Json(leaves))
}

/// Create a leave request. Status starts pending; the approver fields
/// are read-only.
///
/// POST /api/leaves
pub async fn create_leave(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<LeavePayload>,
) -> Result<(StatusCode, Json<LeaveResponse>), ApiError> {
    validate_payload(&payload, chrono::Utc::now().date_naive())?;

    // Plain callers may only file for their own employee profile.
    if !access::can_view_all_leaves(&user) {
        let own = own_employee(&state.db, &user).await?;
        if own.as_deref() != Some(payload.employee_id.as_str()) {
            return Err(ApiError::forbidden(
                "You can only request leave for yourself",
            ));
        }
    }

    let id = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO leaves (id, employee_id, leave_type, start_date, end_date, status, reason)
         VALUES (?, ?, ?, ?, ?, 'pending', ?)",
    )
    .bind(&id)
    .bind(&payload.employee_id)
    .bind(payload.leave_type.to_string())
    .bind(&payload.start_date)
    .bind(&payload.end_date)
    .bind(&payload.reason)
    .execute(&state.db)
    .await?;

    tracing::info!(leave_id = %id, employee_id = %payload.employee_id, "Leave requested");

    Ok((
        StatusCode::CREATED,
        Json(fetch_scoped(&state.db, &user, &id).await?),
    ))
}

/// Get a leave request
///
/// GET /api/leaves/:id
pub async fn get_leave(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    user: AuthUser,
) -> Result<Json<LeaveResponse>, ApiError> {
    Ok(Json(fetch_scoped(&state.db, &user, &id).await?))
}

/// Replace a leave request's own fields. Status and approver only
/// change through approve/reject.
///
/// PUT /api/leaves/:id
pub async fn update_leave(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    user: AuthUser,
    Json(payload): Json<LeavePayload>,
) -> Result<Json<LeaveResponse>, ApiError> {
    validate_payload(&payload, chrono::Utc::now().date_naive())?;
    fetch_scoped(&state.db, &user, &id).await?;

    if !access::can_view_all_leaves(&user) {
        let own = own_employee(&state.db, &user).await?;
        if own.as_deref() != Some(payload.employee_id.as_str()) {
            return Err(ApiError::forbidden(
                "You can only request leave for yourself",
            ));
        }
    }

    sqlx::query(
        "UPDATE leaves
         SET employee_id = ?, leave_type = ?, start_date = ?, end_date = ?, reason = ?
         WHERE id = ?",
    )
    .bind(&payload.employee_id)
    .bind(payload.leave_type.to_string())
    .bind(&payload.start_date)
    .bind(&payload.end_date)
    .bind(&payload.reason)
    .bind(&id)
    .execute(&state.db)
    .await?;

    Ok(Json(fetch_scoped(&state.db, &user, &id).await?))
}

/// Delete a leave request
///
/// DELETE /api/leaves/:id
pub async fn delete_leave(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    user: AuthUser,
) -> Result<StatusCode, ApiError> {
    fetch_scoped(&state.db, &user, &id).await?;

    sqlx::query("DELETE FROM leaves WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Apply an approve/reject decision to a pending leave, recording the
/// decider. Any other current status is a non-fatal rejection naming
/// that status.
pub(crate) async fn perform_decision(
    pool: &DbPool,
    leave_id: &str,
    decision: LeaveStatus,
    approver_id: &str,
) -> Result<(), ApiError> {
    let leave: Option<Leave> = sqlx::query_as("SELECT * FROM leaves WHERE id = ?")
        .bind(leave_id)
        .fetch_optional(pool)
        .await?;
    let leave = leave.ok_or_else(|| ApiError::not_found("Leave not found"))?;

    if !leave.status_enum().is_decidable() {
        let verb = match decision {
            LeaveStatus::Approved => "approved",
            _ => "rejected",
        };
        return Err(ApiError::bad_request(format!(
            "Leave cannot be {} (current status: {})",
            verb, leave.status
        )));
    }

    sqlx::query("UPDATE leaves SET status = ?, approved_by = ? WHERE id = ?")
        .bind(decision.to_string())
        .bind(approver_id)
        .bind(leave_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Approve a pending leave
///
/// POST /api/leaves/:id/approve
pub async fn approve_leave(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    user: AuthUser,
) -> Result<Json<LeaveDecisionResponse>, ApiError> {
    require_cap(&user, caps::APPROVE_LEAVE)?;
    perform_decision(&state.db, &id, LeaveStatus::Approved, &user.user.id).await?;

    tracing::info!(leave_id = %id, approver = %user.user.username, "Leave approved");

    Ok(Json(LeaveDecisionResponse {
        status: "Leave approved".to_string(),
    }))
}

/// Reject a pending leave
///
/// POST /api/leaves/:id/reject
pub async fn reject_leave(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    user: AuthUser,
) -> Result<Json<LeaveDecisionResponse>, ApiError> {
    require_cap(&user, caps::APPROVE_LEAVE)?;
    perform_decision(&state.db, &id, LeaveStatus::Rejected, &user.user.id).await?;

    tracing::info!(leave_id = %id, approver = %user.user.username, "Leave rejected");

    Ok(Json(LeaveDecisionResponse {
        status: "Leave rejected".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::LeaveType;

    fn payload(start: &str, end: &str, reason: Option<String>) -> LeavePayload {
        LeavePayload {
            employee_id: "e1".into(),
            leave_type: LeaveType::Vacation,
            start_date: start.into(),
            end_date: end.into(),
            reason,
        }
    }

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn dates_must_be_ordered() {
        let today = day("2025-06-01");
        assert!(validate_payload(&payload("2025-06-10", "2025-06-12", None), today).is_ok());
        assert!(validate_payload(&payload("2025-06-12", "2025-06-10", None), today).is_err());
    }

    #[test]
    fn leave_cannot_start_in_the_past() {
        let today = day("2025-06-01");
        assert!(validate_payload(&payload("2025-05-31", "2025-06-02", None), today).is_err());
        // Starting today is fine.
        assert!(validate_payload(&payload("2025-06-01", "2025-06-01", None), today).is_ok());
    }

    #[test]
    fn overlong_reason_is_rejected() {
        let today = day("2025-06-01");
        let ok = payload("2025-06-10", "2025-06-12", Some("x".repeat(500)));
        let too_long = payload("2025-06-10", "2025-06-12", Some("x".repeat(501)));
        assert!(validate_payload(&ok, today).is_ok());
        assert!(validate_payload(&too_long, today).is_err());
    }

    #[test]
    fn malformed_dates_are_field_errors() {
        let today = day("2025-06-01");
        assert!(validate_payload(&payload("soon", "2025-06-12", None), today).is_err());
    }

    async fn seed_leave(pool: &DbPool, id: &str, status: &str) {
        sqlx::query(
            "INSERT INTO employees (id, first_name, last_name, position, email)
             VALUES ('e1', 'Petr', 'Svoboda', 'Developer', 'petr@example.com')
             ON CONFLICT (id) DO NOTHING",
        )
        .execute(pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO leaves (id, employee_id, leave_type, start_date, end_date, status)
             VALUES (?, 'e1', 'vacation', '2025-07-01', '2025-07-05', ?)",
        )
        .bind(id)
        .bind(status)
        .execute(pool)
        .await
        .unwrap();
    }

    async fn seed_approver(pool: &DbPool) {
        sqlx::query(
            "INSERT INTO users (id, username, password_hash) VALUES ('u9', 'hr', 'x')",
        )
        .execute(pool)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn pending_leave_can_be_approved_once() {
        let pool = crate::db::test_pool().await;
        seed_approver(&pool).await;
        seed_leave(&pool, "l1", "pending").await;

        perform_decision(&pool, "l1", LeaveStatus::Approved, "u9")
            .await
            .unwrap();

        let leave: Leave = sqlx::query_as("SELECT * FROM leaves WHERE id = 'l1'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(leave.status, "approved");
        assert_eq!(leave.approved_by.as_deref(), Some("u9"));

        let err = perform_decision(&pool, "l1", LeaveStatus::Approved, "u9")
            .await
            .unwrap_err();
        assert!(err.message().contains("current status: approved"));
    }

    #[tokio::test]
    async fn rejection_is_terminal_too() {
        let pool = crate::db::test_pool().await;
        seed_approver(&pool).await;
        seed_leave(&pool, "l2", "pending").await;

        perform_decision(&pool, "l2", LeaveStatus::Rejected, "u9")
            .await
            .unwrap();

        let err = perform_decision(&pool, "l2", LeaveStatus::Approved, "u9")
            .await
            .unwrap_err();
        assert!(err.message().contains("current status: rejected"));
    }

    #[tokio::test]
    async fn cancelled_leave_cannot_be_decided() {
        let pool = crate::db::test_pool().await;
        seed_approver(&pool).await;
        seed_leave(&pool, "l3", "cancelled").await;

        let err = perform_decision(&pool, "l3", LeaveStatus::Rejected, "u9")
            .await
            .unwrap_err();
        assert!(err.message().contains("current status: cancelled"));
    }

    #[tokio::test]
    async fn deciding_a_missing_leave_is_not_found() {
        let pool = crate::db::test_pool().await;
        seed_approver(&pool).await;
        let err = perform_decision(&pool, "nope", LeaveStatus::Approved, "u9")
            .await
            .unwrap_err();
        assert_eq!(err.code(), super::super::error::ErrorCode::NotFound);
    }
}
