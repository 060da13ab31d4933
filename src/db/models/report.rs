//! Free-text employee report models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EmployeeReport {
    pub id: String,
    pub employee_id: String,
    pub timestamp: String,
    pub content: String,
}

/// Report with the employee's display name joined in.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EmployeeReportResponse {
    pub id: String,
    pub employee_id: String,
    pub employee_full_name: String,
    pub timestamp: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct EmployeeReportPayload {
    pub employee_id: String,
    pub content: String,
}
