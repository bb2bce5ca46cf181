//! User self-service operations — profile viewing, updates, and password changes.

use std::sync::Arc;

use tracing::info;

use keygate_auth::password::{PasswordHasher, PasswordValidator};
use keygate_auth::session::SessionRegistry;
use keygate_core::config::auth::AuthConfig;
use keygate_core::error::{AppError, ErrorKind};
use keygate_core::result::AppResult;
use keygate_database::store::CredentialStore;
use keygate_entity::user::User;

use crate::context::RequestContext;

/// Handles user self-service operations.
#[derive(Clone)]
pub struct UserService {
    /// User identity store.
    credentials: Arc<dyn CredentialStore>,
    /// Refresh-token session registry.
    sessions: SessionRegistry,
    /// Argon2id hashing.
    hasher: PasswordHasher,
    /// Strength policy.
    policy: PasswordValidator,
}

impl UserService {
    /// Creates a new user service.
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        sessions: SessionRegistry,
        config: &AuthConfig,
    ) -> Self {
        Self {
            credentials,
            sessions,
            hasher: PasswordHasher::new(),
            policy: PasswordValidator::new(config),
        }
    }

    /// Gets the current user's full profile.
    pub async fn get_profile(&self, ctx: &RequestContext) -> AppResult<User> {
        self.credentials
            .find_by_id(ctx.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    /// Updates the current user's profile fields. `None` leaves a field
    /// unchanged.
    pub async fn update_profile(
        &self,
        ctx: &RequestContext,
        name: Option<String>,
        phone: Option<String>,
    ) -> AppResult<User> {
        if let Some(name) = &name {
            if name.trim().is_empty() {
                return Err(AppError::validation("Name cannot be empty"));
            }
        }

        let user = self
            .credentials
            .update_profile(ctx.user_id, name, phone)
            .await?;
        info!(user_id = ctx.user_id, "Profile updated");
        Ok(user)
    }

    /// Changes the current user's password.
    ///
    /// Revokes every session afterwards, including the one behind the
    /// calling access token: a password change invalidates all outstanding
    /// refresh tokens.
    pub async fn change_password(
        &self,
        ctx: &RequestContext,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        let user = self.get_profile(ctx).await?;

        let hash = user.password_hash.as_deref().ok_or_else(|| {
            AppError::validation("Account has no local password to change")
        })?;
        if !self.hasher.verify_password(current_password, hash)? {
            return Err(AppError::new(
                ErrorKind::InvalidCredentials,
                "Current password is incorrect",
            ));
        }

        self.policy.validate(new_password)?;
        self.policy.validate_not_same(current_password, new_password)?;

        let new_hash = self.hasher.hash_password(new_password)?;
        self.credentials
            .update_password(ctx.user_id, &new_hash)
            .await?;
        let revoked = self.sessions.revoke_all(ctx.user_id).await?;

        info!(user_id = ctx.user_id, revoked, "Password changed");
        Ok(())
    }

    /// Deletes the current user's account and revokes every session.
    pub async fn delete_account(&self, ctx: &RequestContext) -> AppResult<()> {
        self.sessions.revoke_all(ctx.user_id).await?;
        let existed = self.credentials.delete(ctx.user_id).await?;
        if !existed {
            return Err(AppError::not_found("User not found"));
        }
        info!(user_id = ctx.user_id, "Account deleted");
        Ok(())
    }
}
