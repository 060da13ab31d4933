//! Session-cookie authentication.
//!
//! Sessions live in the database; the browser holds an HttpOnly cookie
//! with a random token whose SHA-256 hash is what gets stored. Handlers
//! receive the caller as an explicit [`AuthUser`] extractor argument;
//! there is no ambient current-user state.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::request::Parts,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use rand::Rng;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::sync::Arc;

use crate::db::{DbPool, LoginRequest, LoginResponse, Session, User, UserInfo};
use crate::AppState;

use super::error::ApiError;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "backoffice_session";

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Generate a random session token
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    hex::encode(bytes)
}

/// Hash a token for storage
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// The authenticated caller: user row plus resolved group memberships
/// and the effective capability set (explicit grants union group
/// grants).
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
    pub groups: Vec<String>,
    pub permissions: HashSet<String>,
}

impl AuthUser {
    /// Whether the caller holds a capability. Superusers hold all.
    pub fn has_perm(&self, permission: &str) -> bool {
        self.user.is_superuser || self.permissions.contains(permission)
    }

    /// Whether the caller belongs to a named group.
    pub fn in_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }

    pub fn info(&self) -> UserInfo {
        let mut permissions: Vec<String> = self.permissions.iter().cloned().collect();
        permissions.sort();
        UserInfo {
            id: self.user.id.clone(),
            username: self.user.username.clone(),
            first_name: self.user.first_name.clone(),
            last_name: self.user.last_name.clone(),
            groups: self.groups.clone(),
            permissions,
        }
    }
}

/// Load a user's groups and effective permissions.
async fn load_auth_user(pool: &DbPool, user: User) -> Result<AuthUser, ApiError> {
    let groups: Vec<(String,)> = sqlx::query_as(
        "SELECT g.name FROM groups g
         INNER JOIN user_groups ug ON ug.group_id = g.id
         WHERE ug.user_id = ?
         ORDER BY g.name",
    )
    .bind(&user.id)
    .fetch_all(pool)
    .await?;

    let permissions: Vec<(String,)> = sqlx::query_as(
        "SELECT permission FROM user_permissions WHERE user_id = ?
         UNION
         SELECT gp.permission FROM group_permissions gp
         INNER JOIN user_groups ug ON ug.group_id = gp.group_id
         WHERE ug.user_id = ?",
    )
    .bind(&user.id)
    .bind(&user.id)
    .fetch_all(pool)
    .await?;

    Ok(AuthUser {
        user,
        groups: groups.into_iter().map(|(g,)| g).collect(),
        permissions: permissions.into_iter().map(|(p,)| p).collect(),
    })
}

/// Resolve a session token to the authenticated caller.
pub async fn authenticate_token(pool: &DbPool, token: &str) -> Result<AuthUser, ApiError> {
    let token_hash = hash_token(token);
    let session: Option<Session> = sqlx::query_as(
        "SELECT * FROM sessions WHERE token_hash = ? AND expires_at > datetime('now')",
    )
    .bind(&token_hash)
    .fetch_optional(pool)
    .await?;

    let session = session.ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(&session.user_id)
        .fetch_optional(pool)
        .await?;

    let user = user.ok_or_else(|| ApiError::unauthorized("Authentication required"))?;
    load_auth_user(pool, user).await
}

/// Extract the session token from the cookie, with an Authorization
/// bearer fallback for non-browser clients.
fn extract_token(parts: &Parts) -> Option<String> {
    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }

    parts
        .headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.to_string())
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token =
            extract_token(parts).ok_or_else(|| ApiError::unauthorized("Authentication required"))?;
        authenticate_token(&state.db, &token).await
    }
}

/// Create a session row for a user and return the raw token.
async fn create_session(pool: &DbPool, user_id: &str, ttl_days: i64) -> Result<String, ApiError> {
    let token = generate_token();
    let token_hash = hash_token(&token);
    let expires_at = (chrono::Utc::now() + chrono::Duration::days(ttl_days)).to_rfc3339();

    let session_id = uuid::Uuid::new_v4().to_string();
    sqlx::query("INSERT INTO sessions (id, user_id, token_hash, expires_at) VALUES (?, ?, ?, ?)")
        .bind(&session_id)
        .bind(user_id)
        .bind(&token_hash)
        .bind(&expires_at)
        .execute(pool)
        .await?;

    Ok(token)
}

/// Login endpoint
///
/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE username = ?")
        .bind(&request.username)
        .fetch_optional(&state.db)
        .await?;

    // Invalid credentials are reported as 400, matching the clients
    // this API grew up with.
    let user = user.ok_or_else(|| ApiError::bad_request("Invalid credentials"))?;
    if !verify_password(&request.password, &user.password_hash) {
        return Err(ApiError::bad_request("Invalid credentials"));
    }

    let token = create_session(&state.db, &user.id, state.config.auth.session_ttl_days).await?;
    let auth_user = load_auth_user(&state.db, user).await?;

    tracing::info!(username = %auth_user.user.username, "User logged in");

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            message: "Login successful".to_string(),
            user: auth_user.info(),
        }),
    ))
}

/// Logout endpoint - deletes the session and clears the cookie
///
/// POST /api/auth/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    user: AuthUser,
) -> Result<(CookieJar, Json<serde_json::Value>), ApiError> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        let token_hash = hash_token(cookie.value());
        sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
            .bind(&token_hash)
            .execute(&state.db)
            .await?;
    }

    tracing::info!(username = %user.user.username, "User logged out");

    Ok((
        jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build()),
        Json(serde_json::json!({ "message": "Logout successful" })),
    ))
}

/// Current-user endpoint
///
/// GET /api/auth/user
pub async fn user_info(user: AuthUser) -> Json<UserInfo> {
    Json(user.info())
}

/// Create the bootstrap superuser when no users exist. The password
/// comes from config, or is generated and logged once.
pub async fn ensure_admin_user(
    pool: &DbPool,
    username: &str,
    password: Option<&str>,
) -> anyhow::Result<()> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;
    if count.0 > 0 {
        return Ok(());
    }

    let generated;
    let password = match password {
        Some(p) => p,
        None => {
            generated = generate_token();
            tracing::info!("Generated admin password: {}", generated);
            &generated
        }
    };

    let password_hash =
        hash_password(password).map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;

    sqlx::query(
        "INSERT INTO users (id, username, password_hash, first_name, last_name, is_staff, is_superuser)
         VALUES (?, ?, ?, '', '', 1, 1)",
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(username)
    .bind(&password_hash)
    .execute(pool)
    .await?;

    tracing::info!(username = %username, "Created admin user");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_round_trips() {
        let hash = hash_password("správné-heslo").unwrap();
        assert!(verify_password("správné-heslo", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("správné-heslo", "not-a-hash"));
    }

    #[test]
    fn token_hash_is_deterministic_and_opaque() {
        let token = generate_token();
        assert_eq!(hash_token(&token), hash_token(&token));
        assert_ne!(hash_token(&token), token);
        // Two tokens should never collide in practice.
        assert_ne!(generate_token(), generate_token());
    }

    #[tokio::test]
    async fn session_token_authenticates_until_deleted() {
        let pool = crate::db::test_pool().await;
        ensure_admin_user(&pool, "admin", Some("pw")).await.unwrap();

        let user: User = sqlx::query_as("SELECT * FROM users WHERE username = 'admin'")
            .fetch_one(&pool)
            .await
            .unwrap();

        let token = create_session(&pool, &user.id, 7).await.unwrap();
        let auth = authenticate_token(&pool, &token).await.unwrap();
        assert_eq!(auth.user.username, "admin");
        assert!(auth.user.is_superuser);
        assert!(auth.has_perm("anything-at-all"));

        sqlx::query("DELETE FROM sessions").execute(&pool).await.unwrap();
        assert!(authenticate_token(&pool, &token).await.is_err());
    }

    #[tokio::test]
    async fn admin_user_is_created_only_once() {
        let pool = crate::db::test_pool().await;
        ensure_admin_user(&pool, "admin", Some("pw")).await.unwrap();
        ensure_admin_user(&pool, "admin", Some("pw")).await.unwrap();

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count.0, 1);
    }
}
