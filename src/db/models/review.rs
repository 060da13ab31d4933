//! Performance review models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PerformanceReview {
    pub id: String,
    pub employee_id: String,
    pub date: String,
    pub period: String,
    pub quality_of_work: i64,
    pub attendance: i64,
    pub communication: i64,
    pub teamwork: i64,
    pub initiative: i64,
    pub comments: String,
    pub recommended_training: String,
    pub reviewer_id: Option<String>,
}

/// Review with display fields joined in.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PerformanceReviewResponse {
    pub id: String,
    pub employee_id: String,
    pub employee_full_name: String,
    pub date: String,
    pub period: String,
    pub quality_of_work: i64,
    pub attendance: i64,
    pub communication: i64,
    pub teamwork: i64,
    pub initiative: i64,
    pub comments: String,
    pub recommended_training: String,
    pub reviewer_id: Option<String>,
    pub reviewer_username: Option<String>,
}

/// Payload for creating or replacing a review. The reviewer is stamped
/// from the caller at creation.
#[derive(Debug, Deserialize)]
pub struct PerformanceReviewPayload {
    pub employee_id: String,
    pub period: String,
    pub quality_of_work: i64,
    pub attendance: i64,
    pub communication: i64,
    pub teamwork: i64,
    pub initiative: i64,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub recommended_training: String,
}

impl PerformanceReviewPayload {
    /// The five scores in (field name, value) form, for validation.
    pub fn scores(&self) -> [(&'static str, i64); 5] {
        [
            ("quality_of_work", self.quality_of_work),
            ("attendance", self.attendance),
            ("communication", self.communication),
            ("teamwork", self.teamwork),
            ("initiative", self.initiative),
        ]
    }
}
