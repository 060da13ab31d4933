//! Transaction and transaction-category models, plus the summary
//! arithmetic.
//!
//! Amounts are stored as TEXT decimal strings and summed with
//! `rust_decimal`. SQLite's SUM would coerce to binary floats, which is
//! exactly the rounding drift this module exists to avoid.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Direction of money movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Income => write!(f, "income"),
            TransactionType::Expense => write!(f, "expense"),
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    Card,
    Other,
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::BankTransfer
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "cash"),
            PaymentMethod::BankTransfer => write!(f, "bank_transfer"),
            PaymentMethod::Card => write!(f, "card"),
            PaymentMethod::Other => write!(f, "other"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "bank_transfer" => Ok(PaymentMethod::BankTransfer),
            "card" => Ok(PaymentMethod::Card),
            "other" => Ok(PaymentMethod::Other),
            _ => Err(format!("Unknown payment method: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TransactionCategory {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub category_type: String,
}

#[derive(Debug, Deserialize)]
pub struct TransactionCategoryPayload {
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub category_type: TransactionType,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Transaction {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub amount: String,
    pub category_id: Option<String>,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub transaction_type: String,
    pub payment_method: String,
    pub transaction_date: String,
    pub party_name: Option<String>,
    pub recorded_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Transaction with display fields joined in.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TransactionResponse {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub amount: String,
    pub category_id: Option<String>,
    pub category_name: Option<String>,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub transaction_type: String,
    pub payment_method: String,
    pub transaction_date: String,
    pub party_name: Option<String>,
    pub recorded_by: Option<String>,
    pub recorded_by_username: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Payload for creating or replacing a transaction. `recorded_by` is
/// never taken from the payload; it is stamped from the caller at
/// creation and immutable afterwards.
#[derive(Debug, Deserialize)]
pub struct TransactionPayload {
    pub title: String,
    pub description: Option<String>,
    pub amount: String,
    pub category_id: Option<String>,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    pub transaction_date: String,
    pub party_name: Option<String>,
}

/// One (category, type) bucket of the summary breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub category_name: Option<String>,
    #[serde(rename = "type")]
    pub transaction_type: String,
    pub total: Decimal,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub net_balance: Decimal,
    pub category_summary: Vec<CategorySummary>,
}

#[derive(Debug, Serialize)]
pub struct MonthlySummaryResponse {
    pub year: i32,
    pub month: u32,
    pub monthly_income: Decimal,
    pub monthly_expense: Decimal,
    pub monthly_net_balance: Decimal,
}

/// A row fed into the summary fold: type, category name and amount as
/// stored.
#[derive(Debug, Clone, FromRow)]
pub struct SummaryRow {
    #[sqlx(rename = "type")]
    pub transaction_type: String,
    pub category_name: Option<String>,
    pub amount: String,
}

/// Partition rows by type and sum exactly. Amounts that fail to parse
/// were never accepted by validation; they count as zero rather than
/// poisoning the whole report.
pub fn sum_by_type(rows: &[SummaryRow]) -> (Decimal, Decimal) {
    let mut income = Decimal::ZERO;
    let mut expense = Decimal::ZERO;
    for row in rows {
        let amount: Decimal = row.amount.parse().unwrap_or(Decimal::ZERO);
        match row.transaction_type.parse() {
            Ok(TransactionType::Income) => income += amount,
            Ok(TransactionType::Expense) => expense += amount,
            Err(_) => {}
        }
    }
    (income, expense)
}

/// Group rows by (category name, type), summing amounts, ordered by
/// category name with uncategorized rows first.
pub fn sum_by_category(rows: &[SummaryRow]) -> Vec<CategorySummary> {
    let mut buckets: std::collections::BTreeMap<(Option<String>, String), Decimal> =
        std::collections::BTreeMap::new();
    for row in rows {
        let amount: Decimal = row.amount.parse().unwrap_or(Decimal::ZERO);
        *buckets
            .entry((row.category_name.clone(), row.transaction_type.clone()))
            .or_insert(Decimal::ZERO) += amount;
    }
    buckets
        .into_iter()
        .map(|((category_name, transaction_type), total)| CategorySummary {
            category_name,
            transaction_type,
            total,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(transaction_type: &str, category: Option<&str>, amount: &str) -> SummaryRow {
        SummaryRow {
            transaction_type: transaction_type.to_string(),
            category_name: category.map(|c| c.to_string()),
            amount: amount.to_string(),
        }
    }

    #[test]
    fn sums_partition_by_type() {
        let rows = vec![
            row("income", Some("Sales"), "100.00"),
            row("expense", Some("Rent"), "40.00"),
        ];
        let (income, expense) = sum_by_type(&rows);
        assert_eq!(income, Decimal::new(10000, 2));
        assert_eq!(expense, Decimal::new(4000, 2));
        assert_eq!(income - expense, Decimal::new(6000, 2));
    }

    #[test]
    fn empty_set_sums_to_zero() {
        let (income, expense) = sum_by_type(&[]);
        assert_eq!(income, Decimal::ZERO);
        assert_eq!(expense, Decimal::ZERO);
    }

    #[test]
    fn cent_amounts_sum_exactly() {
        // 0.10 summed ten times is exactly 1.00; the float equivalent
        // would already have drifted.
        let rows: Vec<SummaryRow> = (0..10).map(|_| row("income", None, "0.10")).collect();
        let (income, _) = sum_by_type(&rows);
        assert_eq!(income, Decimal::new(100, 2));
    }

    #[test]
    fn category_breakdown_groups_and_orders_by_name() {
        let rows = vec![
            row("expense", Some("Rent"), "500.00"),
            row("income", Some("Consulting"), "200.00"),
            row("income", Some("Consulting"), "300.00"),
            row("income", None, "10.00"),
        ];
        let summary = sum_by_category(&rows);
        assert_eq!(summary.len(), 3);
        // Uncategorized first, then alphabetical.
        assert_eq!(summary[0].category_name, None);
        assert_eq!(summary[1].category_name.as_deref(), Some("Consulting"));
        assert_eq!(summary[1].total, Decimal::new(50000, 2));
        assert_eq!(summary[2].category_name.as_deref(), Some("Rent"));
    }
}
