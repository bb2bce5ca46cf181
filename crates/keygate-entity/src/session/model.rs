//! Session entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A server-side record tying a refresh token to an identity.
///
/// Only the SHA-256 hash of the refresh token is persisted; the plaintext
/// token lives solely with the client.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    /// Unique session identifier.
    pub id: i64,
    /// The owning user.
    pub user_id: i64,
    /// SHA-256 hex digest of the refresh token.
    #[serde(skip_serializing)]
    pub refresh_token_hash: String,
    /// Network origin of the login, if known.
    pub ip_address: Option<String>,
    /// Client signature string, if provided.
    pub user_agent: Option<String>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the refresh token stops being honored.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Whether the session has passed its expiry.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Data required to register a new session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSession {
    /// The owning user.
    pub user_id: i64,
    /// SHA-256 hex digest of the refresh token.
    pub refresh_token_hash: String,
    /// Session expiry (matches the refresh token TTL).
    pub expires_at: DateTime<Utc>,
    /// Network origin of the login, if known.
    pub ip_address: Option<String>,
    /// Client signature string, if provided.
    pub user_agent: Option<String>,
}
