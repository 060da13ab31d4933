//! Employee models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Employee {
    pub id: String,
    pub user_id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub position: String,
    pub department_id: Option<String>,
    pub email: String,
    pub date_of_birth: Option<String>,
    pub phone_number: Option<String>,
    pub location: Option<String>,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Employee with read-only derived fields for API responses.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EmployeeResponse {
    pub id: String,
    pub user_id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub position: String,
    pub department_id: Option<String>,
    pub department_name: Option<String>,
    pub email: String,
    pub date_of_birth: Option<String>,
    pub phone_number: Option<String>,
    pub location: Option<String>,
}

/// Payload for creating or replacing an employee. Updates are
/// full-replace, so the same shape serves both.
#[derive(Debug, Deserialize)]
pub struct EmployeePayload {
    pub first_name: String,
    pub last_name: String,
    pub position: String,
    pub email: String,
    pub department_id: Option<String>,
    pub user_id: Option<String>,
    pub date_of_birth: Option<String>,
    pub phone_number: Option<String>,
    pub location: Option<String>,
}
