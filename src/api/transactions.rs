//! Transaction and transaction-category endpoints, including the
//! summary reports.
//!
//! Listing and the summaries apply the caller scope first: privileged
//! callers see everything, everyone else only what they recorded.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    sum_by_category, sum_by_type, DbPool, MonthlySummaryResponse, SummaryResponse, SummaryRow,
    TransactionCategory, TransactionCategoryPayload, TransactionPayload, TransactionResponse,
};
use crate::AppState;

use super::access::{self, caps, require_cap};
use super::auth::AuthUser;
use super::error::{ApiError, ValidationErrorBuilder};
use super::validation;

// ---------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------

/// List categories ordered by name
///
/// GET /api/transaction-categories
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
) -> Result<Json<Vec<TransactionCategory>>, ApiError> {
    let categories: Vec<TransactionCategory> =
        sqlx::query_as("SELECT * FROM transaction_categories ORDER BY name ASC")
            .fetch_all(&state.db)
            .await?;
    Ok(Json(categories))
}

/// Create a category
///
/// POST /api/transaction-categories
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<TransactionCategoryPayload>,
) -> Result<(StatusCode, Json<TransactionCategory>), ApiError> {
    require_cap(&user, caps::MANAGE_FINANCE)?;
    validation::validate_required(&payload.name, "Category name")
        .map_err(|e| ApiError::validation_field("name", e))?;

    let category = TransactionCategory {
        id: Uuid::new_v4().to_string(),
        name: payload.name,
        description: payload.description,
        category_type: payload.category_type.to_string(),
    };

    sqlx::query(
        "INSERT INTO transaction_categories (id, name, description, type) VALUES (?, ?, ?, ?)",
    )
    .bind(&category.id)
    .bind(&category.name)
    .bind(&category.description)
    .bind(&category.category_type)
    .execute(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(category)))
}

async fn fetch_category(pool: &DbPool, id: &str) -> Result<TransactionCategory, ApiError> {
    let category: Option<TransactionCategory> =
        sqlx::query_as("SELECT * FROM transaction_categories WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;
    category.ok_or_else(|| ApiError::not_found("Category not found"))
}

/// Get a category
///
/// GET /api/transaction-categories/:id
pub async fn get_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    _user: AuthUser,
) -> Result<Json<TransactionCategory>, ApiError> {
    Ok(Json(fetch_category(&state.db, &id).await?))
}

/// Replace a category
///
/// PUT /api/transaction-categories/:id
pub async fn update_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    user: AuthUser,
    Json(payload): Json<TransactionCategoryPayload>,
) -> Result<Json<TransactionCategory>, ApiError> {
    require_cap(&user, caps::MANAGE_FINANCE)?;
    validation::validate_required(&payload.name, "Category name")
        .map_err(|e| ApiError::validation_field("name", e))?;

    fetch_category(&state.db, &id).await?;

    sqlx::query("UPDATE transaction_categories SET name = ?, description = ?, type = ? WHERE id = ?")
        .bind(&payload.name)
        .bind(&payload.description)
        .bind(payload.category_type.to_string())
        .bind(&id)
        .execute(&state.db)
        .await?;

    Ok(Json(fetch_category(&state.db, &id).await?))
}

/// Delete a category. Its transactions stay, uncategorized.
///
/// DELETE /api/transaction-categories/:id
pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    user: AuthUser,
) -> Result<StatusCode, ApiError> {
    require_cap(&user, caps::MANAGE_FINANCE)?;

    let result = sqlx::query("DELETE FROM transaction_categories WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Category not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------

const TX_SELECT: &str =
    "SELECT t.*, c.name AS category_name, u.username AS recorded_by_username
     FROM transactions t
     LEFT JOIN transaction_categories c ON c.id = t.category_id
     LEFT JOIN users u ON u.id = t.recorded_by";

fn validate_payload(payload: &TransactionPayload) -> Result<String, ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Err(e) = validation::validate_required(&payload.title, "Title") {
        errors.add("title", e);
    }

    let amount = match validation::parse_amount(&payload.amount) {
        Ok(a) => Some(a),
        Err(e) => {
            errors.add("amount", e);
            None
        }
    };

    if let Err(e) = validation::parse_date(&payload.transaction_date, "Transaction date") {
        errors.add("transaction_date", e);
    }

    errors.finish()?;
    Ok(amount.expect("validated above").to_string())
}

/// Fetch a transaction the caller is allowed to see.
async fn fetch_scoped(
    pool: &DbPool,
    user: &AuthUser,
    id: &str,
) -> Result<TransactionResponse, ApiError> {
    let tx: Option<TransactionResponse> = sqlx::query_as(&format!("{} WHERE t.id = ?", TX_SELECT))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    let tx = tx.ok_or_else(|| ApiError::not_found("Transaction not found"))?;

    if !access::can_view_all_transactions(user) && tx.recorded_by.as_deref() != Some(&user.user.id)
    {
        return Err(ApiError::not_found("Transaction not found"));
    }
    Ok(tx)
}

/// List transactions visible to the caller
///
/// GET /api/transactions
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Vec<TransactionResponse>>, ApiError> {
    let transactions: Vec<TransactionResponse> = if access::can_view_all_transactions(&user) {
        sqlx::query_as(&format!(
            "{} ORDER BY t.transaction_date DESC, t.created_at DESC",
            TX_SELECT
        ))
        .fetch_all(&state.db)
        .await?
    } else {
        sqlx::query_as(&format!(
            "{} WHERE t.recorded_by = ? ORDER BY t.transaction_date DESC, t.created_at DESC",
            TX_SELECT
        ))
        .bind(&user.user.id)
        .fetch_all(&state.db)
        .await?
    };
    Ok(Json(transactions))
}

/// Record a transaction. The recorder is stamped from the caller.
///
/// POST /api/transactions
pub async fn create_transaction(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<TransactionPayload>,
) -> Result<(StatusCode, Json<TransactionResponse>), ApiError> {
    let amount = validate_payload(&payload)?;

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    sqlx::query(
        "INSERT INTO transactions
         (id, title, description, amount, category_id, type, payment_method,
          transaction_date, party_name, recorded_by, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(&amount)
    .bind(&payload.category_id)
    .bind(payload.transaction_type.to_string())
    .bind(payload.payment_method.to_string())
    .bind(&payload.transaction_date)
    .bind(&payload.party_name)
    .bind(&user.user.id)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    tracing::info!(transaction_id = %id, "Transaction recorded");

    Ok((
        StatusCode::CREATED,
        Json(fetch_scoped(&state.db, &user, &id).await?),
    ))
}

/// Get a transaction
///
/// GET /api/transactions/:id
pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    user: AuthUser,
) -> Result<Json<TransactionResponse>, ApiError> {
    Ok(Json(fetch_scoped(&state.db, &user, &id).await?))
}

/// Replace a transaction's own fields. The recorder never changes.
///
/// PUT /api/transactions/:id
pub async fn update_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    user: AuthUser,
    Json(payload): Json<TransactionPayload>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let amount = validate_payload(&payload)?;
    fetch_scoped(&state.db, &user, &id).await?;

    sqlx::query(
        "UPDATE transactions
         SET title = ?, description = ?, amount = ?, category_id = ?, type = ?,
             payment_method = ?, transaction_date = ?, party_name = ?, updated_at = ?
         WHERE id = ?",
    )
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(&amount)
    .bind(&payload.category_id)
    .bind(payload.transaction_type.to_string())
    .bind(payload.payment_method.to_string())
    .bind(&payload.transaction_date)
    .bind(&payload.party_name)
    .bind(chrono::Utc::now().to_rfc3339())
    .bind(&id)
    .execute(&state.db)
    .await?;

    Ok(Json(fetch_scoped(&state.db, &user, &id).await?))
}

/// Delete a transaction
///
/// DELETE /api/transactions/:id
pub async fn delete_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    user: AuthUser,
) -> Result<StatusCode, ApiError> {
    fetch_scoped(&state.db, &user, &id).await?;

    sqlx::query("DELETE FROM transactions WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------

/// Rows for the summary fold, caller-scoped and optionally restricted
/// to one YYYY-MM month.
async fn summary_rows(
    pool: &DbPool,
    scope_user: Option<&str>,
    month_prefix: Option<&str>,
) -> Result<Vec<SummaryRow>, ApiError> {
    let mut sql = String::from(
        "SELECT t.type AS type, c.name AS category_name, t.amount
         FROM transactions t
         LEFT JOIN transaction_categories c ON c.id = t.category_id
         WHERE 1=1",
    );
    if scope_user.is_some() {
        sql.push_str(" AND t.recorded_by = ?");
    }
    if month_prefix.is_some() {
        sql.push_str(" AND substr(t.transaction_date, 1, 7) = ?");
    }

    let mut query = sqlx::query_as(&sql);
    if let Some(user_id) = scope_user {
        query = query.bind(user_id);
    }
    if let Some(prefix) = month_prefix {
        query = query.bind(prefix);
    }

    Ok(query.fetch_all(pool).await?)
}

fn scope_for(user: &AuthUser) -> Option<&str> {
    if access::can_view_all_transactions(user) {
        None
    } else {
        Some(user.user.id.as_str())
    }
}

/// Totals, net balance and per-category breakdown over the caller's
/// scope
///
/// GET /api/transactions/summary
pub async fn summary(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<SummaryResponse>, ApiError> {
    let rows = summary_rows(&state.db, scope_for(&user), None).await?;
    let (total_income, total_expense) = sum_by_type(&rows);

    Ok(Json(SummaryResponse {
        total_income,
        total_expense,
        net_balance: total_income - total_expense,
        category_summary: sum_by_category(&rows),
    }))
}

#[derive(Debug, Deserialize)]
pub struct MonthlySummaryParams {
    pub year: Option<String>,
    pub month: Option<String>,
}

/// Parse and validate the year/month pair.
fn parse_year_month(params: &MonthlySummaryParams) -> Result<(i32, u32), ApiError> {
    let (year, month) = match (params.year.as_deref(), params.month.as_deref()) {
        (Some(y), Some(m)) => (y, m),
        _ => {
            return Err(ApiError::bad_request(
                "Year and month parameters are required",
            ))
        }
    };

    let year: i32 = year
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid year or month format"))?;
    let month: u32 = month
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid year or month format"))?;

    Ok((year, month))
}

/// Totals for one calendar month over the caller's scope
///
/// GET /api/transactions/monthly-summary?year=&month=
pub async fn monthly_summary(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MonthlySummaryParams>,
    user: AuthUser,
) -> Result<Json<MonthlySummaryResponse>, ApiError> {
    let (year, month) = parse_year_month(&params)?;
    let prefix = format!("{:04}-{:02}", year, month);

    let rows = summary_rows(&state.db, scope_for(&user), Some(&prefix)).await?;
    let (monthly_income, monthly_expense) = sum_by_type(&rows);

    Ok(Json(MonthlySummaryResponse {
        year,
        month,
        monthly_income,
        monthly_expense,
        monthly_net_balance: monthly_income - monthly_expense,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn params(year: Option<&str>, month: Option<&str>) -> MonthlySummaryParams {
        MonthlySummaryParams {
            year: year.map(|s| s.to_string()),
            month: month.map(|s| s.to_string()),
        }
    }

    #[test]
    fn year_and_month_are_both_required() {
        assert!(parse_year_month(&params(None, None)).is_err());
        assert!(parse_year_month(&params(Some("2025"), None)).is_err());
        assert!(parse_year_month(&params(None, Some("6"))).is_err());
        assert_eq!(
            parse_year_month(&params(Some("2025"), Some("6"))).unwrap(),
            (2025, 6)
        );
    }

    #[test]
    fn non_integer_year_or_month_is_rejected() {
        assert!(parse_year_month(&params(Some("twenty"), Some("6"))).is_err());
        assert!(parse_year_month(&params(Some("2025"), Some("June"))).is_err());
    }

    async fn seed_finance(pool: &DbPool) {
        for (id, username) in [("u1", "alice"), ("u2", "bob")] {
            sqlx::query("INSERT INTO users (id, username, password_hash) VALUES (?, ?, 'x')")
                .bind(id)
                .bind(username)
                .execute(pool)
                .await
                .unwrap();
        }
        sqlx::query(
            "INSERT INTO transaction_categories (id, name, type)
             VALUES ('c1', 'Sales', 'income')",
        )
        .execute(pool)
        .await
        .unwrap();

        // (id, amount, type, category, date, recorder)
        let rows = [
            ("t1", "100.00", "income", Some("c1"), "2025-06-05", "u1"),
            ("t2", "40.00", "expense", None, "2025-06-10", "u1"),
            ("t3", "7.50", "income", Some("c1"), "2025-07-01", "u2"),
        ];
        for (id, amount, tx_type, category, date, recorder) in rows {
            sqlx::query(
                "INSERT INTO transactions
                 (id, title, amount, category_id, type, payment_method, transaction_date, recorded_by)
                 VALUES (?, ?, ?, ?, ?, 'bank_transfer', ?, ?)",
            )
            .bind(id)
            .bind(id)
            .bind(amount)
            .bind(category)
            .bind(tx_type)
            .bind(date)
            .bind(recorder)
            .execute(pool)
            .await
            .unwrap();
        }
    }

    #[tokio::test]
    async fn summary_rows_respect_the_caller_scope() {
        let pool = crate::db::test_pool().await;
        seed_finance(&pool).await;

        let all = summary_rows(&pool, None, None).await.unwrap();
        assert_eq!(all.len(), 3);

        let mine = summary_rows(&pool, Some("u1"), None).await.unwrap();
        assert_eq!(mine.len(), 2);
        let (income, expense) = sum_by_type(&mine);
        assert_eq!(income, Decimal::new(10000, 2));
        assert_eq!(expense, Decimal::new(4000, 2));
    }

    #[tokio::test]
    async fn month_filter_uses_the_transaction_date() {
        let pool = crate::db::test_pool().await;
        seed_finance(&pool).await;

        let june = summary_rows(&pool, None, Some("2025-06")).await.unwrap();
        assert_eq!(june.len(), 2);

        let july = summary_rows(&pool, None, Some("2025-07")).await.unwrap();
        assert_eq!(july.len(), 1);

        let empty = summary_rows(&pool, None, Some("2025-01")).await.unwrap();
        assert!(empty.is_empty());
    }
}
