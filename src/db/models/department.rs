//! Department model. Departments are addressed by their unique name in
//! the API rather than by id.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::employee::EmployeeResponse;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Department {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
}

/// Department with its employee roster, for detail responses.
#[derive(Debug, Clone, Serialize)]
pub struct DepartmentDetail {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub employees: Vec<EmployeeResponse>,
}

/// Payload for creating or replacing a department.
#[derive(Debug, Deserialize)]
pub struct DepartmentPayload {
    pub name: String,
    pub description: Option<String>,
}
