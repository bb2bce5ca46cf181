//! Server-side registry of refresh-token sessions.
//!
//! A refresh token is only honored while its session row exists: revocation
//! is deletion, so a revoked token fails even though its signature still
//! verifies.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use keygate_core::error::AppError;
use keygate_core::result::AppResult;
use keygate_database::store::SessionStore;
use keygate_entity::session::{CreateSession, Session};

use crate::onetime;

/// Optional client metadata recorded alongside a session.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    /// Network origin of the request, if known.
    pub ip_address: Option<String>,
    /// Client signature string, if provided.
    pub user_agent: Option<String>,
}

/// Tracks which refresh tokens are still honored.
///
/// Only the SHA-256 digest of each refresh token reaches the store; the
/// plaintext never leaves the caller.
#[derive(Clone)]
pub struct SessionRegistry {
    store: Arc<dyn SessionStore>,
}

impl SessionRegistry {
    /// Creates a registry over the given session store.
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Registers a new session for a freshly minted refresh token.
    pub async fn register(
        &self,
        user_id: i64,
        refresh_token: &str,
        expires_at: DateTime<Utc>,
        client: &ClientInfo,
    ) -> AppResult<Session> {
        let session = self
            .store
            .create(CreateSession {
                user_id,
                refresh_token_hash: onetime::hash_token(refresh_token),
                expires_at,
                ip_address: client.ip_address.clone(),
                user_agent: client.user_agent.clone(),
            })
            .await?;

        debug!(user_id, session_id = session.id, "Session registered");
        Ok(session)
    }

    /// Looks up the live session backing a refresh token.
    ///
    /// Fails with `SessionRevoked` if the token has no registered session,
    /// whether because it was revoked or because it expired.
    pub async fn validate(&self, refresh_token: &str) -> AppResult<Session> {
        let hash = onetime::hash_token(refresh_token);
        self.store
            .find_by_refresh_token_hash(&hash)
            .await?
            .ok_or_else(AppError::session_revoked)
    }

    /// Revokes every session of a user. Returns the number revoked.
    pub async fn revoke_all(&self, user_id: i64) -> AppResult<u64> {
        let revoked = self.store.revoke_all_for_user(user_id).await?;
        debug!(user_id, revoked, "All sessions revoked");
        Ok(revoked)
    }

    /// Revokes the single session behind a refresh token.
    /// Returns whether a session existed.
    pub async fn revoke_one(&self, refresh_token: &str) -> AppResult<bool> {
        let hash = onetime::hash_token(refresh_token);
        self.store.revoke_by_refresh_token_hash(&hash).await
    }

    /// Drops sessions past their expiry. Returns the number removed.
    pub async fn purge_expired(&self) -> AppResult<u64> {
        self.store.delete_expired().await
    }

    /// Counts sessions that are still honored.
    pub async fn count_active(&self) -> AppResult<u64> {
        self.store.count_active().await
    }
}
