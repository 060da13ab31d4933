//! Performance review endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{DbPool, PerformanceReviewPayload, PerformanceReviewResponse};
use crate::AppState;

use super::access::{self, caps, require_cap};
use super::auth::AuthUser;
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation;

#[derive(Debug, Deserialize)]
pub struct ReviewQueryParams {
    pub employee_id: Option<String>,
}

const REVIEW_SELECT: &str =
    "SELECT r.*, e.first_name || ' ' || e.last_name AS employee_full_name, u.username AS reviewer_username
     FROM performance_reviews r
     INNER JOIN employees e ON e.id = r.employee_id
     LEFT JOIN users u ON u.id = r.reviewer_id";

fn validate_payload(payload: &PerformanceReviewPayload) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if let Err(e) = validation::validate_required(&payload.period, "Review period") {
        errors.add("period", e);
    }
    for (field, value) in payload.scores() {
        if let Err(e) = validation::validate_score(value, field) {
            errors.add(field, e);
        }
    }
    errors.finish()
}

async fn fetch_review(pool: &DbPool, id: &str) -> Result<PerformanceReviewResponse, ApiError> {
    let review: Option<PerformanceReviewResponse> =
        sqlx::query_as(&format!("{} WHERE r.id = ?", REVIEW_SELECT))
            .bind(id)
            .fetch_optional(pool)
            .await?;
    review.ok_or_else(|| ApiError::not_found("Performance review not found"))
}

/// List reviews visible to the caller, optionally for one employee
///
/// GET /api/performance-reviews?employee_id=
pub async fn list_reviews(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReviewQueryParams>,
    user: AuthUser,
) -> Result<Json<Vec<PerformanceReviewResponse>>, ApiError> {
    let scope_employee = if access::can_view_all_reviews(&user) {
        params.employee_id.clone()
    } else {
        // Plain callers only ever see their own employee's reviews,
        // whatever the filter says.
        match access::employee_id_for(&state.db, &user.user.id).await? {
            Some(own) => Some(own),
            None => return Ok(Json(Vec::new())),
        }
    };

    let reviews: Vec<PerformanceReviewResponse> = match scope_employee {
        Some(employee_id) => {
            sqlx::query_as(&format!(
                "{} WHERE r.employee_id = ? ORDER BY r.date DESC",
                REVIEW_SELECT
            ))
            .bind(&employee_id)
            .fetch_all(&state.db)
            .await?
        }
        None => {
            sqlx::query_as(&format!("{} ORDER BY r.date DESC", REVIEW_SELECT))
                .fetch_all(&state.db)
                .await?
        }
    };
    Ok(Json(reviews))
}

/// Create a review. The reviewer and review date are stamped here.
///
/// POST /api/performance-reviews
pub async fn create_review(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<PerformanceReviewPayload>,
) -> Result<(StatusCode, Json<PerformanceReviewResponse>), ApiError> {
    require_cap(&user, caps::MANAGE_REVIEWS)?;
    validate_payload(&payload)?;

    let id = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO performance_reviews
         (id, employee_id, date, period, quality_of_work, attendance, communication,
          teamwork, initiative, comments, recommended_training, reviewer_id)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&payload.employee_id)
    .bind(chrono::Utc::now().date_naive().to_string())
    .bind(&payload.period)
    .bind(payload.quality_of_work)
    .bind(payload.attendance)
    .bind(payload.communication)
    .bind(payload.teamwork)
    .bind(payload.initiative)
    .bind(&payload.comments)
    .bind(&payload.recommended_training)
    .bind(&user.user.id)
    .execute(&state.db)
    .await?;

    tracing::info!(review_id = %id, employee_id = %payload.employee_id, "Performance review created");

    Ok((StatusCode::CREATED, Json(fetch_review(&state.db, &id).await?)))
}

/// Get a review
///
/// GET /api/performance-reviews/:id
pub async fn get_review(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    user: AuthUser,
) -> Result<Json<PerformanceReviewResponse>, ApiError> {
    let review = fetch_review(&state.db, &id).await?;

    if !access::can_view_all_reviews(&user) {
        let own = access::employee_id_for(&state.db, &user.user.id).await?;
        if own.as_deref() != Some(review.employee_id.as_str()) {
            return Err(ApiError::not_found("Performance review not found"));
        }
    }

    Ok(Json(review))
}

/// Replace a review's scores and comments. The reviewer and date stay
/// as stamped at creation.
///
/// PUT /api/performance-reviews/:id
pub async fn update_review(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    user: AuthUser,
    Json(payload): Json<PerformanceReviewPayload>,
) -> Result<Json<PerformanceReviewResponse>, ApiError> {
    require_cap(&user, caps::MANAGE_REVIEWS)?;
    validate_payload(&payload)?;

    let result = sqlx::query(
        "UPDATE performance_reviews
         SET employee_id = ?, period = ?, quality_of_work = ?, attendance = ?,
             communication = ?, teamwork = ?, initiative = ?, comments = ?,
             recommended_training = ?
         WHERE id = ?",
    )
    .bind(&payload.employee_id)
    .bind(&payload.period)
    .bind(payload.quality_of_work)
    .bind(payload.attendance)
    .bind(payload.communication)
    .bind(payload.teamwork)
    .bind(payload.initiative)
    .bind(&payload.comments)
    .bind(&payload.recommended_training)
    .bind(&id)
    .execute(&state.db)
    .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Performance review not found"));
    }

    Ok(Json(fetch_review(&state.db, &id).await?))
}

/// Delete a review
///
/// DELETE /api/performance-reviews/:id
pub async fn delete_review(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    user: AuthUser,
) -> Result<StatusCode, ApiError> {
    require_cap(&user, caps::MANAGE_REVIEWS)?;

    let result = sqlx::query("DELETE FROM performance_reviews WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Performance review not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
