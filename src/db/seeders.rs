//! Database seeders for built-in authorization data.
//!
//! The named groups and their capability grants are seeded on every
//! startup so new capabilities reach existing installs.

use anyhow::Result;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::api::access::{caps, groups};

/// Seed the built-in groups and their capability grants (idempotent).
pub async fn seed_groups(pool: &SqlitePool) -> Result<()> {
    info!("Seeding built-in groups...");

    // Format: (group name, granted capabilities)
    let grants: Vec<(&str, Vec<&str>)> = vec![
        (
            groups::HR_SPECIALIST,
            vec![
                caps::APPROVE_LEAVE,
                caps::VIEW_ALL_LEAVES,
                caps::MANAGE_EMPLOYEES,
                caps::MANAGE_DEPARTMENTS,
                caps::MANAGE_DOCUMENTS,
                caps::MANAGE_REVIEWS,
            ],
        ),
        (
            groups::CEO,
            vec![
                caps::APPROVE_LEAVE,
                caps::VIEW_ALL_LEAVES,
                caps::VIEW_ALL_TRANSACTIONS,
                caps::MANAGE_EMPLOYEES,
                caps::MANAGE_DEPARTMENTS,
                caps::MANAGE_FINANCE,
                caps::MANAGE_DOCUMENTS,
                caps::MANAGE_REVIEWS,
            ],
        ),
        (
            groups::FINANCE_MANAGER,
            vec![caps::VIEW_ALL_TRANSACTIONS, caps::MANAGE_FINANCE],
        ),
    ];

    for (name, permissions) in grants {
        let existing: Option<(String,)> = sqlx::query_as("SELECT id FROM groups WHERE name = ?")
            .bind(name)
            .fetch_optional(pool)
            .await?;

        let group_id = match existing {
            Some((id,)) => id,
            None => {
                let id = Uuid::new_v4().to_string();
                sqlx::query("INSERT INTO groups (id, name) VALUES (?, ?)")
                    .bind(&id)
                    .bind(name)
                    .execute(pool)
                    .await?;
                id
            }
        };

        for permission in permissions {
            sqlx::query(
                "INSERT OR IGNORE INTO group_permissions (group_id, permission) VALUES (?, ?)",
            )
            .bind(&group_id)
            .bind(permission)
            .execute(pool)
            .await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeding_twice_leaves_one_group_each() {
        let pool = crate::db::test_pool().await;
        seed_groups(&pool).await.unwrap();

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM groups")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count.0, 3);

        let grants: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM group_permissions gp
             INNER JOIN groups g ON g.id = gp.group_id
             WHERE g.name = ?",
        )
        .bind(groups::FINANCE_MANAGER)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(grants.0, 2);
    }
}
