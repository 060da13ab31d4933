//! Leave request models and the approval state machine.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Kind of leave being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaveType {
    Vacation,
    Sick,
    Personal,
    Other,
}

impl std::fmt::Display for LeaveType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LeaveType::Vacation => write!(f, "vacation"),
            LeaveType::Sick => write!(f, "sick"),
            LeaveType::Personal => write!(f, "personal"),
            LeaveType::Other => write!(f, "other"),
        }
    }
}

impl std::str::FromStr for LeaveType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "vacation" => Ok(LeaveType::Vacation),
            "sick" => Ok(LeaveType::Sick),
            "personal" => Ok(LeaveType::Personal),
            "other" => Ok(LeaveType::Other),
            _ => Err(format!("Unknown leave type: {}", s)),
        }
    }
}

/// Workflow status of a leave request.
///
/// Pending is the initial state; approve and reject move a request out
/// of it and record who decided. Approved and rejected are terminal in
/// this workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl LeaveStatus {
    /// Whether an approve/reject decision may be applied from this state.
    pub fn is_decidable(&self) -> bool {
        matches!(self, LeaveStatus::Pending)
    }
}

impl std::fmt::Display for LeaveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LeaveStatus::Pending => write!(f, "pending"),
            LeaveStatus::Approved => write!(f, "approved"),
            LeaveStatus::Rejected => write!(f, "rejected"),
            LeaveStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for LeaveStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(LeaveStatus::Pending),
            "approved" => Ok(LeaveStatus::Approved),
            "rejected" => Ok(LeaveStatus::Rejected),
            "cancelled" => Ok(LeaveStatus::Cancelled),
            _ => Err(format!("Unknown leave status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Leave {
    pub id: String,
    pub employee_id: String,
    pub leave_type: String,
    pub start_date: String,
    pub end_date: String,
    pub status: String,
    pub reason: Option<String>,
    pub approved_by: Option<String>,
}

impl Leave {
    pub fn status_enum(&self) -> LeaveStatus {
        self.status.parse().unwrap_or(LeaveStatus::Pending)
    }
}

/// Leave with display fields joined in.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LeaveResponse {
    pub id: String,
    pub employee_id: String,
    pub employee_full_name: String,
    pub leave_type: String,
    pub start_date: String,
    pub end_date: String,
    pub status: String,
    pub reason: Option<String>,
    pub approved_by: Option<String>,
    pub approved_by_username: Option<String>,
}

/// Payload for creating or replacing a leave request. Status and
/// approver are read-only; they change only through approve/reject.
#[derive(Debug, Deserialize)]
pub struct LeavePayload {
    pub employee_id: String,
    pub leave_type: LeaveType,
    pub start_date: String,
    pub end_date: String,
    pub reason: Option<String>,
}

/// Outcome of an approve/reject call.
#[derive(Debug, Serialize)]
pub struct LeaveDecisionResponse {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            LeaveStatus::Pending,
            LeaveStatus::Approved,
            LeaveStatus::Rejected,
            LeaveStatus::Cancelled,
        ] {
            assert_eq!(status.to_string().parse::<LeaveStatus>(), Ok(status));
        }
        assert!("on-hold".parse::<LeaveStatus>().is_err());
    }

    #[test]
    fn only_pending_is_decidable() {
        assert!(LeaveStatus::Pending.is_decidable());
        assert!(!LeaveStatus::Approved.is_decidable());
        assert!(!LeaveStatus::Rejected.is_decidable());
        assert!(!LeaveStatus::Cancelled.is_decidable());
    }

    #[test]
    fn unknown_stored_status_defaults_to_pending() {
        let leave = Leave {
            id: "x".into(),
            employee_id: "e".into(),
            leave_type: "vacation".into(),
            start_date: "2025-01-01".into(),
            end_date: "2025-01-02".into(),
            status: "garbage".into(),
            reason: None,
            approved_by: None,
        };
        assert_eq!(leave.status_enum(), LeaveStatus::Pending);
    }
}
