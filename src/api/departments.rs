//! Department endpoints. Departments are addressed by their unique
//! name.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{Department, DepartmentDetail, DepartmentPayload, EmployeeResponse};
use crate::AppState;

use super::access::{caps, require_cap};
use super::auth::AuthUser;
use super::error::{ApiError, ValidationErrorBuilder};

fn validate_payload(payload: &DepartmentPayload) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if let Err(e) = super::validation::validate_required(&payload.name, "Department name") {
        errors.add("name", e);
    }
    if payload.name.len() > 100 {
        errors.add("name", "Department name is too long (max 100 characters)");
    }
    errors.finish()
}

/// List all departments
///
/// GET /api/departments
pub async fn list_departments(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
) -> Result<Json<Vec<Department>>, ApiError> {
    let departments: Vec<Department> =
        sqlx::query_as("SELECT * FROM departments ORDER BY name ASC")
            .fetch_all(&state.db)
            .await?;
    Ok(Json(departments))
}

/// Create a department
///
/// POST /api/departments
pub async fn create_department(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<DepartmentPayload>,
) -> Result<(StatusCode, Json<Department>), ApiError> {
    require_cap(&user, caps::MANAGE_DEPARTMENTS)?;
    validate_payload(&payload)?;

    let department = Department {
        id: Uuid::new_v4().to_string(),
        name: payload.name,
        description: payload.description,
    };

    sqlx::query("INSERT INTO departments (id, name, description) VALUES (?, ?, ?)")
        .bind(&department.id)
        .bind(&department.name)
        .bind(&department.description)
        .execute(&state.db)
        .await?;

    tracing::info!(name = %department.name, "Department created");

    Ok((StatusCode::CREATED, Json(department)))
}

async fn find_by_name(state: &AppState, name: &str) -> Result<Department, ApiError> {
    let department: Option<Department> = sqlx::query_as("SELECT * FROM departments WHERE name = ?")
        .bind(name)
        .fetch_optional(&state.db)
        .await?;
    department.ok_or_else(|| ApiError::not_found("Department not found"))
}

/// Get a department with its employee roster
///
/// GET /api/departments/:name
pub async fn get_department(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    _user: AuthUser,
) -> Result<Json<DepartmentDetail>, ApiError> {
    let department = find_by_name(&state, &name).await?;

    let employees: Vec<EmployeeResponse> = sqlx::query_as(
        "SELECT e.*, e.first_name || ' ' || e.last_name AS full_name, d.name AS department_name
         FROM employees e
         LEFT JOIN departments d ON d.id = e.department_id
         WHERE e.department_id = ?
         ORDER BY e.last_name, e.first_name",
    )
    .bind(&department.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(DepartmentDetail {
        id: department.id,
        name: department.name,
        description: department.description,
        employees,
    }))
}

/// Replace a department
///
/// PUT /api/departments/:name
pub async fn update_department(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    user: AuthUser,
    Json(payload): Json<DepartmentPayload>,
) -> Result<Json<Department>, ApiError> {
    require_cap(&user, caps::MANAGE_DEPARTMENTS)?;
    validate_payload(&payload)?;

    let department = find_by_name(&state, &name).await?;

    sqlx::query("UPDATE departments SET name = ?, description = ? WHERE id = ?")
        .bind(&payload.name)
        .bind(&payload.description)
        .bind(&department.id)
        .execute(&state.db)
        .await?;

    Ok(Json(Department {
        id: department.id,
        name: payload.name,
        description: payload.description,
    }))
}

/// Delete a department. Employees keep existing with their department
/// cleared (SET NULL).
///
/// DELETE /api/departments/:name
pub async fn delete_department(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    user: AuthUser,
) -> Result<StatusCode, ApiError> {
    require_cap(&user, caps::MANAGE_DEPARTMENTS)?;

    let department = find_by_name(&state, &name).await?;

    sqlx::query("DELETE FROM departments WHERE id = ?")
        .bind(&department.id)
        .execute(&state.db)
        .await?;

    tracing::info!(name = %department.name, "Department deleted");

    Ok(StatusCode::NO_CONTENT)
}
