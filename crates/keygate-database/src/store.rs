//! Storage traits for pluggable persistence backends.
//!
//! The credential store owns user identity records; the session store owns
//! refresh-token sessions. Per-user session mutations must be linearizable
//! with respect to each other so a logout cannot race a concurrent login
//! into leaving a stale session honored.

use std::collections::HashMap;
use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use keygate_core::result::AppResult;
use keygate_core::types::pagination::{PageRequest, PageResponse};
use keygate_entity::permission::Permission;
use keygate_entity::session::{CreateSession, Session};
use keygate_entity::user::{CreateUser, User, UserRole};

/// Aggregate user counts for the admin dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStats {
    /// Total registered users.
    pub total_users: u64,
    /// Users with a verified email.
    pub verified_users: u64,
    /// Users able to log in.
    pub active_users: u64,
    /// User count per role.
    pub users_by_role: HashMap<UserRole, u64>,
    /// Users created since the requested cutoff.
    pub recent_registrations: u64,
}

/// Persistence operations for user identity records.
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Create a new user. Fails with `DuplicateIdentity` if the email (or
    /// federation id) is already taken.
    async fn create(&self, data: CreateUser) -> AppResult<User>;

    /// Find a user by primary key.
    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>>;

    /// Find a user by email (case-insensitive).
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Find a user by federation subject identifier.
    async fn find_by_federation_id(&self, federation_id: &str) -> AppResult<Option<User>>;

    /// Find the user holding an unexpired email verification token.
    async fn find_by_verification_token_hash(&self, hash: &str) -> AppResult<Option<User>>;

    /// Find the user holding an unexpired password reset token.
    async fn find_by_reset_token_hash(&self, hash: &str) -> AppResult<Option<User>>;

    /// List all users with pagination, newest first.
    async fn list(&self, page: &PageRequest) -> AppResult<PageResponse<User>>;

    /// Update profile fields. `None` leaves a field unchanged.
    async fn update_profile(
        &self,
        id: i64,
        name: Option<String>,
        phone: Option<String>,
    ) -> AppResult<User>;

    /// Store a new password hash. Also clears any outstanding reset token.
    async fn update_password(&self, id: i64, password_hash: &str) -> AppResult<()>;

    /// Change a user's role, replacing the explicit permission set with the
    /// new role's defaults.
    async fn set_role(
        &self,
        id: i64,
        role: UserRole,
        permissions: HashSet<Permission>,
    ) -> AppResult<()>;

    /// Replace a user's explicit permission set.
    async fn set_permissions(&self, id: i64, permissions: HashSet<Permission>) -> AppResult<()>;

    /// Enable or disable the account.
    async fn set_active(&self, id: i64, is_active: bool) -> AppResult<()>;

    /// Link a federation subject identifier to an existing user.
    async fn attach_federation_id(&self, id: i64, federation_id: &str) -> AppResult<()>;

    /// Mark the email verified and clear the verification token.
    async fn mark_email_verified(&self, id: i64) -> AppResult<()>;

    /// Store a hashed password reset token with its expiry.
    async fn set_reset_token(
        &self,
        id: i64,
        hash: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Record a successful login.
    async fn touch_last_login(&self, id: i64, at: DateTime<Utc>) -> AppResult<()>;

    /// Delete a user. Returns whether a record existed.
    async fn delete(&self, id: i64) -> AppResult<bool>;

    /// Aggregate counts for the admin dashboard.
    async fn stats(&self, recent_since: DateTime<Utc>) -> AppResult<UserStats>;
}

/// Persistence operations for refresh-token sessions.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Register a new session.
    async fn create(&self, data: CreateSession) -> AppResult<Session>;

    /// Find a session by the refresh token's SHA-256 digest. Expired or
    /// revoked sessions are not returned.
    async fn find_by_refresh_token_hash(&self, hash: &str) -> AppResult<Option<Session>>;

    /// Revoke every session of a user. Returns the number revoked.
    async fn revoke_all_for_user(&self, user_id: i64) -> AppResult<u64>;

    /// Revoke the single session holding this refresh token digest.
    /// Returns whether a session existed.
    async fn revoke_by_refresh_token_hash(&self, hash: &str) -> AppResult<bool>;

    /// Drop sessions past their expiry. Returns the number removed.
    async fn delete_expired(&self) -> AppResult<u64>;

    /// Count sessions that are still honored.
    async fn count_active(&self) -> AppResult<u64>;
}
