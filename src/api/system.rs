//! Public company-level endpoints.

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;

use super::error::ApiError;

#[derive(Debug, Serialize)]
pub struct CompanyStats {
    pub total_employees: i64,
    pub total_departments: i64,
}

/// Headline counts for the landing page. Public by design.
///
/// GET /api/company-stats
pub async fn company_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CompanyStats>, ApiError> {
    let total_employees: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employees")
        .fetch_one(&state.db)
        .await?;
    let total_departments: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM departments")
        .fetch_one(&state.db)
        .await?;

    Ok(Json(CompanyStats {
        total_employees,
        total_departments,
    }))
}
