//! Company document models.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Kind of document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Contract,
    Policy,
    Training,
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentType::Contract => write!(f, "contract"),
            DocumentType::Policy => write!(f, "policy"),
            DocumentType::Training => write!(f, "training"),
        }
    }
}

impl std::str::FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "contract" => Ok(DocumentType::Contract),
            "policy" => Ok(DocumentType::Policy),
            "training" => Ok(DocumentType::Training),
            _ => Err(format!("Unknown document type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub document_type: String,
    pub is_public: bool,
    pub effective_date: Option<String>,
    pub contract_end_date: Option<String>,
    pub employee_id: Option<String>,
    pub uploaded_by: Option<String>,
    pub uploaded_at: String,
}

impl Document {
    fn end_date(&self) -> Option<NaiveDate> {
        if self.document_type != DocumentType::Contract.to_string() {
            return None;
        }
        self.contract_end_date
            .as_deref()
            .and_then(|d| d.parse().ok())
    }

    /// Contract ending within 30 days of `today`, inclusive of both
    /// bounds.
    pub fn is_expiring_soon(&self, today: NaiveDate) -> bool {
        match self.end_date() {
            Some(end) => {
                end >= today && end <= today.checked_add_days(Days::new(30)).unwrap_or(today)
            }
            None => false,
        }
    }

    /// Contract whose end date has already passed.
    pub fn has_expired(&self, today: NaiveDate) -> bool {
        match self.end_date() {
            Some(end) => end < today,
            None => false,
        }
    }
}

/// Document row with the uploader's username joined in.
#[derive(Debug, Clone, FromRow)]
pub struct DocumentRow {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub document_type: String,
    pub is_public: bool,
    pub effective_date: Option<String>,
    pub contract_end_date: Option<String>,
    pub employee_id: Option<String>,
    pub uploaded_by: Option<String>,
    pub uploaded_by_username: Option<String>,
    pub uploaded_at: String,
}

impl DocumentRow {
    /// Attach the derived expiry fields, evaluated against `today`.
    pub fn into_response(self, today: NaiveDate) -> DocumentResponse {
        let document = Document {
            id: self.id,
            title: self.title,
            description: self.description,
            document_type: self.document_type,
            is_public: self.is_public,
            effective_date: self.effective_date,
            contract_end_date: self.contract_end_date,
            employee_id: self.employee_id,
            uploaded_by: self.uploaded_by,
            uploaded_at: self.uploaded_at,
        };
        DocumentResponse {
            is_expiring_soon: document.is_expiring_soon(today),
            has_expired: document.has_expired(today),
            id: document.id,
            title: document.title,
            description: document.description,
            document_type: document.document_type,
            is_public: document.is_public,
            effective_date: document.effective_date,
            contract_end_date: document.contract_end_date,
            employee_id: document.employee_id,
            uploaded_by: document.uploaded_by,
            uploaded_by_username: self.uploaded_by_username,
            uploaded_at: document.uploaded_at,
        }
    }
}

/// Document with display and derived fields for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentResponse {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub document_type: String,
    pub is_public: bool,
    pub effective_date: Option<String>,
    pub contract_end_date: Option<String>,
    pub employee_id: Option<String>,
    pub uploaded_by: Option<String>,
    pub uploaded_by_username: Option<String>,
    pub uploaded_at: String,
    pub is_expiring_soon: bool,
    pub has_expired: bool,
}

/// Payload for creating or replacing a document. The uploader is
/// stamped from the caller.
#[derive(Debug, Deserialize)]
pub struct DocumentPayload {
    pub title: String,
    pub description: Option<String>,
    pub document_type: DocumentType,
    #[serde(default)]
    pub is_public: bool,
    pub effective_date: Option<String>,
    pub contract_end_date: Option<String>,
    pub employee_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contract(end: Option<&str>) -> Document {
        Document {
            id: "d1".into(),
            title: "Employment contract".into(),
            description: None,
            document_type: "contract".into(),
            is_public: false,
            effective_date: None,
            contract_end_date: end.map(|e| e.to_string()),
            employee_id: None,
            uploaded_by: None,
            uploaded_at: "2025-01-01T00:00:00Z".into(),
        }
    }

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn expiring_window_is_inclusive() {
        let today = day("2025-06-01");
        assert!(contract(Some("2025-06-01")).is_expiring_soon(today));
        assert!(contract(Some("2025-07-01")).is_expiring_soon(today));
        assert!(!contract(Some("2025-07-02")).is_expiring_soon(today));
        assert!(!contract(Some("2025-05-31")).is_expiring_soon(today));
    }

    #[test]
    fn expired_is_strictly_before_today() {
        let today = day("2025-06-01");
        assert!(contract(Some("2025-05-31")).has_expired(today));
        assert!(!contract(Some("2025-06-01")).has_expired(today));
    }

    #[test]
    fn non_contracts_never_expire() {
        let mut doc = contract(Some("2000-01-01"));
        doc.document_type = "policy".into();
        let today = day("2025-06-01");
        assert!(!doc.has_expired(today));
        assert!(!doc.is_expiring_soon(today));
    }

    #[test]
    fn contract_without_end_date_never_expires() {
        let today = day("2025-06-01");
        assert!(!contract(None).has_expired(today));
        assert!(!contract(None).is_expiring_soon(today));
    }
}
