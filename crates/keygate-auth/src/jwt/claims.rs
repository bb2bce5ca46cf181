//! Token claims structure used in access and refresh tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use keygate_entity::user::UserRole;

/// The claims payload embedded in every token.
///
/// The field set is fixed: `{sub, role, user_id, exp, type}`. Tokens are
/// self-contained — validity is determined purely by signature and expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject — the user's email.
    pub sub: String,
    /// User role at the time of token issuance.
    pub role: UserRole,
    /// Numeric user identifier.
    pub user_id: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Token kind: "access" or "refresh".
    #[serde(rename = "type")]
    pub kind: TokenKind,
}

/// Distinguishes access tokens from refresh tokens.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Short-lived access token for protected calls.
    Access,
    /// Long-lived refresh token for obtaining new access tokens.
    Refresh,
}

impl Claims {
    /// Returns the expiration as a `DateTime<Utc>`.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }

    /// Checks whether this token has expired.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}
