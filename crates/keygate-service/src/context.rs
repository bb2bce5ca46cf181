//! Request context carrying the authenticated caller and resolved permissions.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use keygate_entity::permission::Permission;
use keygate_entity::user::UserRole;

/// Context for the current authenticated request.
///
/// Produced by [`crate::AuthService::authenticate`] from a valid access token
/// and passed into service methods so that every operation knows *who* is
/// acting and with which effective permissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The authenticated user's ID.
    pub user_id: i64,
    /// The user's email address.
    pub email: String,
    /// The user's role as currently stored, not as issued in the token.
    pub role: UserRole,
    /// Effective permission set: role defaults plus explicit overrides.
    pub permissions: HashSet<Permission>,
    /// When the request was authenticated.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(
        user_id: i64,
        email: String,
        role: UserRole,
        permissions: HashSet<Permission>,
    ) -> Self {
        Self {
            user_id,
            email,
            role,
            permissions,
            request_time: Utc::now(),
        }
    }

    /// Returns whether the current user is an admin.
    pub fn is_admin(&self) -> bool {
        matches!(self.role, UserRole::Admin)
    }

    /// Returns whether the caller holds a permission.
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }
}
