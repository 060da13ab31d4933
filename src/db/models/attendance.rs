//! Attendance record models.
//!
//! A record's `date` is the calendar date of its check-in time, fixed
//! at creation. An "open" record is one without a check-out time.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AttendanceRecord {
    pub id: String,
    pub employee_id: String,
    pub check_in_time: String,
    pub check_out_time: Option<String>,
    pub date: String,
}

impl AttendanceRecord {
    pub fn is_open(&self) -> bool {
        self.check_out_time.is_none()
    }
}

/// Attendance record with the employee's display name joined in.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AttendanceRecordResponse {
    pub id: String,
    pub employee_id: String,
    pub employee_full_name: String,
    pub check_in_time: String,
    pub check_out_time: Option<String>,
    pub date: String,
}

/// Payload for creating or replacing an attendance record directly
/// through the attendance-history collection (as opposed to the
/// check-in/check-out operations, which stamp times themselves).
#[derive(Debug, Deserialize)]
pub struct AttendanceRecordPayload {
    pub employee_id: String,
    pub check_in_time: String,
    pub check_out_time: Option<String>,
}

/// Result of a successful check-in or check-out.
#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub message: String,
    pub record_id: String,
}
