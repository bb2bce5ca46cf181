//! User role enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Roles available in the authorization system.
///
/// The set is closed on purpose: illegal roles are unrepresentable, and
/// role-to-permission defaults are keyed off these variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Full system administrator.
    Admin,
    /// HR staff: can manage users but not roles.
    Hr,
    /// Regular registered user.
    User,
    /// Applicant account with read-only access.
    Candidate,
}

impl UserRole {
    /// Check if this role is an admin.
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Hr => "hr",
            Self::User => "user",
            Self::Candidate => "candidate",
        }
    }
}

impl Default for UserRole {
    fn default() -> Self {
        Self::User
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = keygate_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "hr" => Ok(Self::Hr),
            "user" => Ok(Self::User),
            "candidate" => Ok(Self::Candidate),
            _ => Err(keygate_core::AppError::validation(format!(
                "Invalid user role: '{s}'. Expected one of: admin, hr, user, candidate"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        assert_eq!("admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!("HR".parse::<UserRole>().unwrap(), UserRole::Hr);
        assert!("superuser".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_default_role() {
        assert_eq!(UserRole::default(), UserRole::User);
    }
}
