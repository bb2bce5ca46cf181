//! Role-to-permission mapping definitions.

use std::collections::{HashMap, HashSet};

use keygate_entity::permission::Permission;
use keygate_entity::user::UserRole;

/// Defines the default permission set attached to each role.
///
/// These defaults are granted at signup and whenever an admin changes a
/// user's role; explicit per-user overrides are layered on top by the
/// authorization engine.
#[derive(Debug, Clone)]
pub struct RolePolicies {
    /// Role → default set of permissions.
    policies: HashMap<UserRole, HashSet<Permission>>,
}

impl RolePolicies {
    /// Creates the default policy set.
    pub fn new() -> Self {
        let mut policies = HashMap::new();

        policies.insert(UserRole::Admin, Permission::all());

        policies.insert(
            UserRole::Hr,
            [Permission::Read, Permission::Write, Permission::ManageUsers]
                .into_iter()
                .collect(),
        );

        policies.insert(UserRole::User, [Permission::Read].into_iter().collect());
        policies.insert(
            UserRole::Candidate,
            [Permission::Read].into_iter().collect(),
        );

        Self { policies }
    }

    /// The default permission set for a role.
    pub fn defaults_for(&self, role: UserRole) -> HashSet<Permission> {
        self.policies.get(&role).cloned().unwrap_or_default()
    }

    /// Role defaults plus explicit per-user overrides.
    pub fn effective(
        &self,
        role: UserRole,
        explicit: &HashSet<Permission>,
    ) -> HashSet<Permission> {
        let mut set = self.defaults_for(role);
        set.extend(explicit.iter().copied());
        set
    }
}

impl Default for RolePolicies {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_gets_everything() {
        let policies = RolePolicies::new();
        assert_eq!(policies.defaults_for(UserRole::Admin), Permission::all());
    }

    #[test]
    fn test_effective_is_union() {
        let policies = RolePolicies::new();
        let explicit = [Permission::Delete].into_iter().collect();
        let effective = policies.effective(UserRole::User, &explicit);
        assert!(effective.contains(&Permission::Read));
        assert!(effective.contains(&Permission::Delete));
        assert!(!effective.contains(&Permission::ManageRoles));
    }
}
