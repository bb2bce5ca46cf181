//! The authorization decision engine.
//!
//! Pure evaluation: never inspects credentials, never mutates state.

use std::collections::HashSet;

use keygate_core::error::AppError;
use keygate_entity::permission::Permission;
use keygate_entity::user::UserRole;

use super::policies::RolePolicies;

/// Evaluates role/permission predicates against a caller's claims.
///
/// Decision rule: allow iff (required_roles is empty OR the caller's role is
/// one of them) AND (required_permissions is empty OR the caller's effective
/// permission set intersects them).
#[derive(Debug, Clone)]
pub struct AuthorizationEngine {
    /// Role default policies.
    policies: RolePolicies,
}

impl AuthorizationEngine {
    /// Creates a new engine with the default policy set.
    pub fn new() -> Self {
        Self {
            policies: RolePolicies::new(),
        }
    }

    /// Creates an engine with custom policies.
    pub fn with_policies(policies: RolePolicies) -> Self {
        Self { policies }
    }

    /// Checks the decision rule, returning `InsufficientPermission` on deny.
    pub fn authorize(
        &self,
        role: UserRole,
        explicit: &HashSet<Permission>,
        required_roles: &[UserRole],
        required_permissions: &[Permission],
    ) -> Result<(), AppError> {
        if !required_roles.is_empty() && !required_roles.contains(&role) {
            return Err(AppError::insufficient_permission(format!(
                "Role '{role}' is not authorized for this action"
            )));
        }

        if !required_permissions.is_empty() {
            let effective = self.policies.effective(role, explicit);
            let granted = required_permissions.iter().any(|p| effective.contains(p));
            if !granted {
                return Err(AppError::insufficient_permission(
                    "You don't have permission to perform this action",
                ));
            }
        }

        Ok(())
    }

    /// Whether the caller holds a single permission.
    pub fn has_permission(
        &self,
        role: UserRole,
        explicit: &HashSet<Permission>,
        permission: Permission,
    ) -> bool {
        self.policies.effective(role, explicit).contains(&permission)
    }

    /// The caller's full effective permission set.
    pub fn effective_permissions(
        &self,
        role: UserRole,
        explicit: &HashSet<Permission>,
    ) -> HashSet<Permission> {
        self.policies.effective(role, explicit)
    }

    /// Returns a reference to the underlying policies.
    pub fn policies(&self) -> &RolePolicies {
        &self.policies
    }
}

impl Default for AuthorizationEngine {
    fn default() -> Self {
        Self::new()
    }
}
