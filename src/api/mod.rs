pub mod access;
mod attendance;
pub mod auth;
mod departments;
mod documents;
mod employees;
pub mod error;
mod leaves;
mod reports;
mod reviews;
mod system;
mod transactions;
mod validation;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Auth routes (login is public, the rest authenticate per handler)
    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/user", get(auth::user_info));

    let api_routes = Router::new()
        // Employees and the check-in/check-out operations
        .route("/employees", get(employees::list_employees))
        .route("/employees", post(employees::create_employee))
        .route("/employees/:id", get(employees::get_employee))
        .route("/employees/:id", put(employees::update_employee))
        .route("/employees/:id", delete(employees::delete_employee))
        .route("/employees/:id/check_in", post(employees::check_in))
        .route("/employees/:id/check_out", post(employees::check_out))
        // Departments (addressed by name)
        .route("/departments", get(departments::list_departments))
        .route("/departments", post(departments::create_department))
        .route("/departments/:name", get(departments::get_department))
        .route("/departments/:name", put(departments::update_department))
        .route("/departments/:name", delete(departments::delete_department))
        // Employee reports
        .route("/reports", get(reports::list_reports))
        .route("/reports", post(reports::create_report))
        .route("/reports/:id", get(reports::get_report))
        .route("/reports/:id", put(reports::update_report))
        .route("/reports/:id", delete(reports::delete_report))
        // Attendance history
        .route("/attendance-history", get(attendance::list_records))
        .route("/attendance-history", post(attendance::create_record))
        .route("/attendance-history/:id", get(attendance::get_record))
        .route("/attendance-history/:id", put(attendance::update_record))
        .route("/attendance-history/:id", delete(attendance::delete_record))
        // Leaves and the approval workflow
        .route("/leaves", get(leaves::list_leaves))
        .route("/leaves", post(leaves::create_leave))
        .route("/leaves/:id", get(leaves::get_leave))
        .route("/leaves/:id", put(leaves::update_leave))
        .route("/leaves/:id", delete(leaves::delete_leave))
        .route("/leaves/:id/approve", post(leaves::approve_leave))
        .route("/leaves/:id/reject", post(leaves::reject_leave))
        // Transaction categories
        .route("/transaction-categories", get(transactions::list_categories))
        .route("/transaction-categories", post(transactions::create_category))
        .route("/transaction-categories/:id", get(transactions::get_category))
        .route("/transaction-categories/:id", put(transactions::update_category))
        .route("/transaction-categories/:id", delete(transactions::delete_category))
        // Transactions and summaries
        .route("/transactions", get(transactions::list_transactions))
        .route("/transactions", post(transactions::create_transaction))
        .route("/transactions/summary", get(transactions::summary))
        .route("/transactions/monthly-summary", get(transactions::monthly_summary))
        .route("/transactions/:id", get(transactions::get_transaction))
        .route("/transactions/:id", put(transactions::update_transaction))
        .route("/transactions/:id", delete(transactions::delete_transaction))
        // Documents
        .route("/documents", get(documents::list_documents))
        .route("/documents", post(documents::create_document))
        .route("/documents/:id", get(documents::get_document))
        .route("/documents/:id", put(documents::update_document))
        .route("/documents/:id", delete(documents::delete_document))
        // Performance reviews
        .route("/performance-reviews", get(reviews::list_reviews))
        .route("/performance-reviews", post(reviews::create_review))
        .route("/performance-reviews/:id", get(reviews::get_review))
        .route("/performance-reviews/:id", put(reviews::update_review))
        .route("/performance-reviews/:id", delete(reviews::delete_review))
        // Public company stats
        .route("/company-stats", get(system::company_stats));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/auth", auth_routes)
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
