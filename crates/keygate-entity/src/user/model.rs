//! User entity model.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

use crate::permission::Permission;

use super::role::UserRole;

/// A registered identity in the KeyGate system.
///
/// Invariant: at least one of `password_hash` or `federation_id` is present.
/// A purely federated user has no local password.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique numeric identifier.
    pub id: i64,
    /// Email address, unique and case-normalized at the store.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Phone number (optional).
    pub phone: Option<String>,
    /// Argon2id password hash. Absent for purely federated users.
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    /// Subject identifier at the federation provider, unique when present.
    pub federation_id: Option<String>,
    /// Role (primary authorization unit).
    pub role: UserRole,
    /// Explicit per-user permission overrides, consulted alongside the
    /// role's default set.
    pub permissions: Json<HashSet<Permission>>,
    /// Whether the account may log in.
    pub is_active: bool,
    /// Whether the email address has been verified.
    pub is_email_verified: bool,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
    /// Last successful login time.
    pub last_login_at: Option<DateTime<Utc>>,
    /// SHA-256 hash of the outstanding email verification token.
    #[serde(skip_serializing)]
    pub email_verification_token_hash: Option<String>,
    /// When the verification token expires.
    pub email_verification_expires_at: Option<DateTime<Utc>>,
    /// SHA-256 hash of the outstanding password reset token.
    #[serde(skip_serializing)]
    pub reset_token_hash: Option<String>,
    /// When the reset token expires.
    pub reset_token_expires_at: Option<DateTime<Utc>>,
}

impl User {
    /// The explicit permission overrides granted to this user.
    pub fn explicit_permissions(&self) -> &HashSet<Permission> {
        &self.permissions.0
    }

    /// Check if this user has admin privileges.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Whether this user authenticates through the federation provider only.
    pub fn is_federated_only(&self) -> bool {
        self.password_hash.is_none() && self.federation_id.is_some()
    }
}

/// Data required to create a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Email address.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Phone number (optional).
    pub phone: Option<String>,
    /// Pre-hashed password. `None` for federated users.
    pub password_hash: Option<String>,
    /// Federation subject identifier, if created through federated login.
    pub federation_id: Option<String>,
    /// Assigned role.
    pub role: UserRole,
    /// Explicit permission set granted at creation time.
    pub permissions: HashSet<Permission>,
    /// Whether the email is already verified (true for federated users).
    pub is_email_verified: bool,
    /// Hashed email verification token, if one was issued.
    pub email_verification_token_hash: Option<String>,
    /// Verification token expiry.
    pub email_verification_expires_at: Option<DateTime<Utc>>,
}
