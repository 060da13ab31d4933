//! Input validation for API requests.
//!
//! Per-field validators returning `Result<(), String>`; handlers
//! collect failures with the `ValidationErrorBuilder` from the `error`
//! module.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;

/// Longest accepted leave reason, in characters.
pub const MAX_REASON_LENGTH: usize = 500;

lazy_static! {
    /// Regex for validating email addresses
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9][-a-zA-Z0-9]*(\.[a-zA-Z0-9][-a-zA-Z0-9]*)+$"
    ).unwrap();
}

/// Validate an email address
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email is too long (max 254 characters)".to_string());
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate a required non-empty string field
pub fn validate_required(value: &str, label: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} is required", label));
    }
    Ok(())
}

/// Parse a calendar date in YYYY-MM-DD form
pub fn parse_date(value: &str, label: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("{} must be a date in YYYY-MM-DD format", label))
}

/// Validate an optional date field, returning the parsed date when present
pub fn parse_optional_date(value: &Option<String>, label: &str) -> Result<Option<NaiveDate>, String> {
    match value.as_deref() {
        Some(raw) if !raw.is_empty() => parse_date(raw, label).map(Some),
        _ => Ok(None),
    }
}

/// Validate a leave reason length
pub fn validate_reason(reason: &Option<String>) -> Result<(), String> {
    if let Some(reason) = reason {
        if reason.chars().count() > MAX_REASON_LENGTH {
            return Err(format!(
                "Reason is too long (max {} characters)",
                MAX_REASON_LENGTH
            ));
        }
    }
    Ok(())
}

/// Validate and normalize a money amount: an exact decimal with at most
/// two fractional digits and fifteen significant digits overall.
pub fn parse_amount(raw: &str) -> Result<Decimal, String> {
    let amount: Decimal = raw
        .trim()
        .parse()
        .map_err(|_| "Amount must be a decimal number".to_string())?;

    if amount.scale() > 2 {
        return Err("Amount cannot have more than two decimal places".to_string());
    }

    // 15 digits total, matching the storage contract.
    let digits = amount.mantissa().unsigned_abs().to_string().len();
    if digits > 15 {
        return Err("Amount has too many digits (max 15)".to_string());
    }

    Ok(amount.normalize())
}

/// Validate a performance score
pub fn validate_score(value: i64, label: &str) -> Result<(), String> {
    if value < 0 {
        return Err(format!("{} must be a non-negative integer", label));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_emails() {
        assert!(validate_email("jana.novak@example.com").is_ok());
        assert!(validate_email("a+b@sub.domain.org").is_ok());
    }

    #[test]
    fn rejects_malformed_emails() {
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("x@nodot").is_err());
    }

    #[test]
    fn parses_dates_strictly() {
        assert!(parse_date("2025-06-01", "start_date").is_ok());
        assert!(parse_date("01/06/2025", "start_date").is_err());
        assert!(parse_date("2025-13-01", "start_date").is_err());
    }

    #[test]
    fn reason_limit_counts_characters() {
        assert!(validate_reason(&None).is_ok());
        assert!(validate_reason(&Some("x".repeat(500))).is_ok());
        assert!(validate_reason(&Some("x".repeat(501))).is_err());
    }

    #[test]
    fn amounts_allow_at_most_two_decimal_places() {
        assert_eq!(parse_amount("100.00").unwrap(), Decimal::new(100, 0));
        assert_eq!(parse_amount("0.10").unwrap(), Decimal::new(1, 1));
        assert!(parse_amount("1.999").is_err());
        assert!(parse_amount("not-a-number").is_err());
    }

    #[test]
    fn amounts_enforce_the_digit_limit() {
        assert!(parse_amount("999999999999999").is_ok());
        assert!(parse_amount("1000000000000000").is_err());
    }

    #[test]
    fn scores_must_be_non_negative() {
        assert!(validate_score(0, "attendance").is_ok());
        assert!(validate_score(5, "attendance").is_ok());
        assert!(validate_score(-1, "attendance").is_err());
    }
}
