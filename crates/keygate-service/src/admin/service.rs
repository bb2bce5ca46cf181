//! Administrative operations over users, roles, and permissions.
//!
//! Every method authorizes the caller through the decision engine before
//! touching the store. Role requirements and permission requirements are
//! independent gates; both must pass.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use keygate_auth::rbac::AuthorizationEngine;
use keygate_auth::session::SessionRegistry;
use keygate_core::error::AppError;
use keygate_core::result::AppResult;
use keygate_core::types::pagination::{PageRequest, PageResponse};
use keygate_database::store::{CredentialStore, UserStats};
use keygate_entity::permission::Permission;
use keygate_entity::user::{User, UserRole};

use crate::context::RequestContext;

/// How far back a registration counts as "recent" on the dashboard.
const RECENT_WINDOW_DAYS: i64 = 7;

/// Aggregate figures for the admin dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardStats {
    /// User counts by status and role.
    pub users: UserStats,
    /// Sessions currently honored across all users.
    pub active_sessions: u64,
}

/// A permission with its human-readable description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionInfo {
    /// The permission.
    pub permission: Permission,
    /// What it grants.
    pub description: String,
}

/// Handles administrative user management.
#[derive(Clone)]
pub struct AdminService {
    /// User identity store.
    credentials: Arc<dyn CredentialStore>,
    /// Refresh-token session registry.
    sessions: SessionRegistry,
    /// Role/permission decision engine.
    engine: AuthorizationEngine,
}

impl AdminService {
    /// Creates a new admin service.
    pub fn new(credentials: Arc<dyn CredentialStore>, sessions: SessionRegistry) -> Self {
        Self {
            credentials,
            sessions,
            engine: AuthorizationEngine::new(),
        }
    }

    /// Lists all users, newest first. Requires the admin or HR role.
    pub async fn list_users(
        &self,
        ctx: &RequestContext,
        page: &PageRequest,
    ) -> AppResult<PageResponse<User>> {
        self.authorize(ctx, &[UserRole::Admin, UserRole::Hr], &[])?;
        self.credentials.list(page).await
    }

    /// Fetches a single user. Requires the admin or HR role.
    pub async fn get_user(&self, ctx: &RequestContext, id: i64) -> AppResult<User> {
        self.authorize(ctx, &[UserRole::Admin, UserRole::Hr], &[])?;
        self.credentials
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    /// Changes a user's role. Requires the manage-roles permission.
    ///
    /// The target's explicit permission set is replaced by the new role's
    /// defaults; any previous overrides are discarded.
    pub async fn set_role(&self, ctx: &RequestContext, id: i64, role: UserRole) -> AppResult<()> {
        self.authorize(ctx, &[], &[Permission::ManageRoles])?;
        self.require_exists(id).await?;

        let defaults = self.engine.policies().defaults_for(role);
        self.credentials.set_role(id, role, defaults).await?;

        info!(admin_id = ctx.user_id, user_id = id, %role, "Role changed");
        Ok(())
    }

    /// Replaces a user's explicit permission set. Requires the manage-users
    /// permission.
    pub async fn set_permissions(
        &self,
        ctx: &RequestContext,
        id: i64,
        permissions: HashSet<Permission>,
    ) -> AppResult<()> {
        self.authorize(ctx, &[], &[Permission::ManageUsers])?;
        self.require_exists(id).await?;

        self.credentials.set_permissions(id, permissions).await?;
        info!(admin_id = ctx.user_id, user_id = id, "Permissions replaced");
        Ok(())
    }

    /// Enables or disables an account. Requires the admin role.
    ///
    /// Deactivation also revokes the target's sessions so that outstanding
    /// refresh tokens stop working immediately.
    pub async fn set_active_status(
        &self,
        ctx: &RequestContext,
        id: i64,
        is_active: bool,
    ) -> AppResult<()> {
        self.authorize(ctx, &[UserRole::Admin], &[])?;
        if ctx.user_id == id {
            return Err(AppError::validation(
                "Cannot change your own active status",
            ));
        }
        self.require_exists(id).await?;

        self.credentials.set_active(id, is_active).await?;
        if !is_active {
            self.sessions.revoke_all(id).await?;
        }

        info!(admin_id = ctx.user_id, user_id = id, is_active, "Active status changed");
        Ok(())
    }

    /// Deletes a user and revokes their sessions. Requires the delete
    /// permission. Self-deletion through the admin surface is refused.
    pub async fn delete_user(&self, ctx: &RequestContext, id: i64) -> AppResult<()> {
        self.authorize(ctx, &[], &[Permission::Delete])?;
        if ctx.user_id == id {
            return Err(AppError::validation("Cannot delete your own account"));
        }

        self.sessions.revoke_all(id).await?;
        let existed = self.credentials.delete(id).await?;
        if !existed {
            return Err(AppError::not_found("User not found"));
        }

        info!(admin_id = ctx.user_id, user_id = id, "User deleted");
        Ok(())
    }

    /// Aggregate dashboard figures. Requires the admin role.
    pub async fn dashboard_stats(&self, ctx: &RequestContext) -> AppResult<DashboardStats> {
        self.authorize(ctx, &[UserRole::Admin], &[])?;

        let recent_since = Utc::now() - Duration::days(RECENT_WINDOW_DAYS);
        let users = self.credentials.stats(recent_since).await?;
        let active_sessions = self.sessions.count_active().await?;

        Ok(DashboardStats {
            users,
            active_sessions,
        })
    }

    /// Lists every known permission with its description. Requires the
    /// admin role.
    pub fn list_permissions(&self, ctx: &RequestContext) -> AppResult<Vec<PermissionInfo>> {
        self.authorize(ctx, &[UserRole::Admin], &[])?;

        Ok(Permission::ALL
            .iter()
            .map(|p| PermissionInfo {
                permission: *p,
                description: p.description().to_string(),
            })
            .collect())
    }

    /// Runs the decision engine against the caller's context.
    fn authorize(
        &self,
        ctx: &RequestContext,
        required_roles: &[UserRole],
        required_permissions: &[Permission],
    ) -> AppResult<()> {
        self.engine.authorize(
            ctx.role,
            &ctx.permissions,
            required_roles,
            required_permissions,
        )
    }

    /// Fails with `NotFound` unless the target user exists.
    async fn require_exists(&self, id: i64) -> AppResult<()> {
        self.credentials
            .find_by_id(id)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::not_found("User not found"))
    }
}
