mod models;
mod seeders;

pub use models::*;
pub use seeders::seed_groups;

use anyhow::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

pub type DbPool = SqlitePool;

/// Execute a SQL migration file, properly handling comments
async fn execute_sql(pool: &SqlitePool, sql: &str) -> Result<()> {
    for statement in sql.split(';') {
        // Strip SQL comment lines (lines starting with --)
        let cleaned: String = statement
            .lines()
            .filter(|line| !line.trim().starts_with("--"))
            .collect::<Vec<_>>()
            .join("\n");
        let trimmed = cleaned.trim();
        if !trimmed.is_empty() {
            sqlx::query(trimmed).execute(pool).await?;
        }
    }
    Ok(())
}

pub async fn init(data_dir: &Path) -> Result<DbPool> {
    let db_path = data_dir.join("backoffice.db");
    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    info!("Initializing database at {}", db_path.display());

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    // Enable WAL mode for better concurrency
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;

    run_migrations(&pool).await?;

    info!("Database initialized successfully");
    Ok(pool)
}

async fn table_exists(pool: &SqlitePool, name: &str) -> Result<bool> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT name FROM sqlite_master WHERE type='table' AND name = ?")
            .bind(name)
            .fetch_optional(pool)
            .await?;
    Ok(row.is_some())
}

pub(crate) async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    info!("Running database migrations...");

    // Migration 001: users, sessions, groups and permission grants
    execute_sql(pool, include_str!("../../migrations/001_initial.sql")).await?;

    // Migration 002: departments, employees and employee reports
    if !table_exists(pool, "employees").await? {
        execute_sql(pool, include_str!("../../migrations/002_hr_core.sql")).await?;
    }

    // Migration 003: attendance records
    if !table_exists(pool, "attendance_records").await? {
        execute_sql(pool, include_str!("../../migrations/003_attendance.sql")).await?;
    }

    // Migration 004: leave requests
    if !table_exists(pool, "leaves").await? {
        execute_sql(pool, include_str!("../../migrations/004_leaves.sql")).await?;
    }

    // Migration 005: transaction categories and transactions
    if !table_exists(pool, "transactions").await? {
        execute_sql(pool, include_str!("../../migrations/005_finance.sql")).await?;
    }

    // Migration 006: documents
    if !table_exists(pool, "documents").await? {
        execute_sql(pool, include_str!("../../migrations/006_documents.sql")).await?;
    }

    // Migration 007: performance reviews
    if !table_exists(pool, "performance_reviews").await? {
        execute_sql(pool, include_str!("../../migrations/007_performance_reviews.sql")).await?;
    }

    // Seed/update the built-in groups and their capability grants
    seeders::seed_groups(pool).await?;

    info!("Migrations completed");
    Ok(())
}

/// Fresh in-memory database with the full schema and seed data, for
/// tests.
#[cfg(test)]
pub(crate) async fn test_pool() -> DbPool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await
        .expect("enable foreign keys");
    run_migrations(&pool).await.expect("migrations");
    pool
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let pool = test_pool().await;
        run_migrations(&pool).await.expect("second run");
        assert!(table_exists(&pool, "employees").await.unwrap());
        assert!(table_exists(&pool, "leaves").await.unwrap());
        assert!(table_exists(&pool, "performance_reviews").await.unwrap());
    }

    #[tokio::test]
    async fn on_disk_database_initializes() {
        let dir = tempfile::tempdir().unwrap();
        let pool = init(dir.path()).await.expect("init");
        assert!(table_exists(&pool, "transactions").await.unwrap());
    }
}
