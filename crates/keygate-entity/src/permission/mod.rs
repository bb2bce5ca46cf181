//! The fixed permission registry.
//!
//! Permissions are a closed, admin-managed set checked via set membership.
//! They are deliberately not free-form strings.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// A named capability that can be granted to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Can read data.
    Read,
    /// Can write data.
    Write,
    /// Can delete data.
    Delete,
    /// Can manage users.
    ManageUsers,
    /// Can manage roles.
    ManageRoles,
}

impl Permission {
    /// Every permission in the registry.
    pub const ALL: [Permission; 5] = [
        Permission::Read,
        Permission::Write,
        Permission::Delete,
        Permission::ManageUsers,
        Permission::ManageRoles,
    ];

    /// Return the permission as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Delete => "delete",
            Self::ManageUsers => "manage_users",
            Self::ManageRoles => "manage_roles",
        }
    }

    /// Human description, shown in admin tooling.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Read => "Can read data",
            Self::Write => "Can write data",
            Self::Delete => "Can delete data",
            Self::ManageUsers => "Can manage users",
            Self::ManageRoles => "Can manage roles",
        }
    }

    /// The full registry as a set.
    pub fn all() -> HashSet<Permission> {
        Self::ALL.into_iter().collect()
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Permission {
    type Err = keygate_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "read" => Ok(Self::Read),
            "write" => Ok(Self::Write),
            "delete" => Ok(Self::Delete),
            "manage_users" => Ok(Self::ManageUsers),
            "manage_roles" => Ok(Self::ManageRoles),
            _ => Err(keygate_core::AppError::validation(format!(
                "Unknown permission: '{s}'"
            ))),
        }
    }
}
