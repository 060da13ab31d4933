//! Capability- and group-based access control.
//!
//! Handlers consume the caller as boolean predicates: "has capability
//! X", "belongs to group Y". Listing endpoints apply the scope
//! predicates here before any other query parameter.

use crate::db::DbPool;

use super::auth::AuthUser;
use super::error::ApiError;

/// Capability names, as stored in the permission grant tables.
pub mod caps {
    pub const APPROVE_LEAVE: &str = "approve_leave";
    pub const VIEW_ALL_LEAVES: &str = "view_all_leaves";
    pub const VIEW_ALL_TRANSACTIONS: &str = "view_all_transactions";
    pub const MANAGE_EMPLOYEES: &str = "manage_employees";
    pub const MANAGE_DEPARTMENTS: &str = "manage_departments";
    pub const MANAGE_FINANCE: &str = "manage_finance";
    pub const MANAGE_DOCUMENTS: &str = "manage_documents";
    pub const MANAGE_REVIEWS: &str = "manage_reviews";
}

/// Built-in group names.
pub mod groups {
    pub const HR_SPECIALIST: &str = "HR Specialist";
    pub const CEO: &str = "CEO";
    pub const FINANCE_MANAGER: &str = "Finance Manager";
}

/// Require a capability, or fail with 403.
pub fn require_cap(user: &AuthUser, capability: &str) -> Result<(), ApiError> {
    if user.has_perm(capability) {
        return Ok(());
    }
    Err(ApiError::forbidden(format!(
        "This action requires the {} permission",
        capability
    )))
}

/// Whether the caller sees every leave request, or only their own.
pub fn can_view_all_leaves(user: &AuthUser) -> bool {
    user.in_group(groups::HR_SPECIALIST)
        || user.in_group(groups::CEO)
        || user.has_perm(caps::VIEW_ALL_LEAVES)
}

/// Whether the caller sees every transaction, or only ones they
/// recorded.
pub fn can_view_all_transactions(user: &AuthUser) -> bool {
    user.user.is_staff
        || user.in_group(groups::FINANCE_MANAGER)
        || user.has_perm(caps::VIEW_ALL_TRANSACTIONS)
}

/// Whether the caller sees every document, or only public ones plus
/// their own.
pub fn can_view_all_documents(user: &AuthUser) -> bool {
    user.user.is_staff || user.has_perm(caps::MANAGE_DOCUMENTS)
}

/// Whether the caller sees every performance review, or only their
/// own employee's.
pub fn can_view_all_reviews(user: &AuthUser) -> bool {
    user.user.is_staff || user.has_perm(caps::MANAGE_REVIEWS)
}

/// The employee profile linked to the caller's user, if any.
pub async fn employee_id_for(pool: &DbPool, user_id: &str) -> Result<Option<String>, ApiError> {
    let row: Option<(String,)> = sqlx::query_as("SELECT id FROM employees WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|(id,)| id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::User;
    use std::collections::HashSet;

    fn plain_user() -> AuthUser {
        AuthUser {
            user: User {
                id: "u1".into(),
                username: "jnovak".into(),
                password_hash: String::new(),
                first_name: "Jana".into(),
                last_name: "Novák".into(),
                is_staff: false,
                is_superuser: false,
                created_at: "2025-01-01T00:00:00Z".into(),
            },
            groups: Vec::new(),
            permissions: HashSet::new(),
        }
    }

    #[test]
    fn plain_users_are_scoped_to_their_own_records() {
        let user = plain_user();
        assert!(!can_view_all_leaves(&user));
        assert!(!can_view_all_transactions(&user));
        assert!(require_cap(&user, caps::APPROVE_LEAVE).is_err());
    }

    #[test]
    fn group_membership_widens_the_scope() {
        let mut user = plain_user();
        user.groups.push(groups::HR_SPECIALIST.to_string());
        assert!(can_view_all_leaves(&user));
        assert!(!can_view_all_transactions(&user));

        let mut finance = plain_user();
        finance.groups.push(groups::FINANCE_MANAGER.to_string());
        assert!(can_view_all_transactions(&finance));
        assert!(!can_view_all_leaves(&finance));
    }

    #[test]
    fn explicit_grants_and_staff_flag_work_without_groups() {
        let mut user = plain_user();
        user.permissions.insert(caps::VIEW_ALL_LEAVES.to_string());
        assert!(can_view_all_leaves(&user));

        let mut staff = plain_user();
        staff.user.is_staff = true;
        assert!(can_view_all_transactions(&staff));
    }

    #[test]
    fn superusers_pass_every_capability_check() {
        let mut user = plain_user();
        user.user.is_superuser = true;
        assert!(require_cap(&user, caps::MANAGE_FINANCE).is_ok());
        assert!(can_view_all_leaves(&user));
    }
}
