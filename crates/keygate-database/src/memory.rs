//! In-memory store implementations using Tokio mutexes.
//!
//! Suitable for single-node deployments and tests. Each store serializes its
//! mutations behind one mutex, which gives the per-user linearizability the
//! session registry requires.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use tokio::sync::Mutex;

use keygate_core::error::AppError;
use keygate_core::result::AppResult;
use keygate_core::types::pagination::{PageRequest, PageResponse};
use keygate_entity::permission::Permission;
use keygate_entity::session::{CreateSession, Session};
use keygate_entity::user::{CreateUser, User, UserRole};

use crate::store::{CredentialStore, SessionStore, UserStats};

/// Internal state for the memory credential store.
#[derive(Debug, Default)]
struct UserTable {
    next_id: i64,
    users: HashMap<i64, User>,
}

/// In-memory credential store.
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    state: Arc<Mutex<UserTable>>,
}

impl MemoryCredentialStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn create(&self, data: CreateUser) -> AppResult<User> {
        let mut state = self.state.lock().await;

        let email = data.email.to_lowercase();
        if state
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&email))
        {
            return Err(AppError::duplicate_identity("Email already registered"));
        }
        if let Some(fid) = &data.federation_id {
            if state
                .users
                .values()
                .any(|u| u.federation_id.as_deref() == Some(fid.as_str()))
            {
                return Err(AppError::duplicate_identity(
                    "Federation id already registered",
                ));
            }
        }

        state.next_id += 1;
        let now = Utc::now();
        let user = User {
            id: state.next_id,
            email,
            name: data.name,
            phone: data.phone,
            password_hash: data.password_hash,
            federation_id: data.federation_id,
            role: data.role,
            permissions: Json(data.permissions),
            is_active: true,
            is_email_verified: data.is_email_verified,
            created_at: now,
            updated_at: now,
            last_login_at: None,
            email_verification_token_hash: data.email_verification_token_hash,
            email_verification_expires_at: data.email_verification_expires_at,
            reset_token_hash: None,
            reset_token_expires_at: None,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .state
            .lock()
            .await
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_federation_id(&self, federation_id: &str) -> AppResult<Option<User>> {
        Ok(self
            .state
            .lock()
            .await
            .users
            .values()
            .find(|u| u.federation_id.as_deref() == Some(federation_id))
            .cloned())
    }

    async fn find_by_verification_token_hash(&self, hash: &str) -> AppResult<Option<User>> {
        let now = Utc::now();
        Ok(self
            .state
            .lock()
            .await
            .users
            .values()
            .find(|u| {
                u.email_verification_token_hash.as_deref() == Some(hash)
                    && u.email_verification_expires_at.is_some_and(|e| e > now)
            })
            .cloned())
    }

    async fn find_by_reset_token_hash(&self, hash: &str) -> AppResult<Option<User>> {
        let now = Utc::now();
        Ok(self
            .state
            .lock()
            .await
            .users
            .values()
            .find(|u| {
                u.reset_token_hash.as_deref() == Some(hash)
                    && u.reset_token_expires_at.is_some_and(|e| e > now)
            })
            .cloned())
    }

    async fn list(&self, page: &PageRequest) -> AppResult<PageResponse<User>> {
        let state = self.state.lock().await;
        let mut users: Vec<User> = state.users.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        let total = users.len() as u64;
        let items = users
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();
        Ok(PageResponse::new(items, page.page, page.page_size, total))
    }

    async fn update_profile(
        &self,
        id: i64,
        name: Option<String>,
        phone: Option<String>,
    ) -> AppResult<User> {
        let mut state = self.state.lock().await;
        let user = state
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("User not found"))?;
        if let Some(name) = name {
            user.name = name;
        }
        if let Some(phone) = phone {
            user.phone = Some(phone);
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if let Some(user) = state.users.get_mut(&id) {
            user.password_hash = Some(password_hash.to_string());
            user.reset_token_hash = None;
            user.reset_token_expires_at = None;
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn set_role(
        &self,
        id: i64,
        role: UserRole,
        permissions: HashSet<Permission>,
    ) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if let Some(user) = state.users.get_mut(&id) {
            user.role = role;
            user.permissions = Json(permissions);
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn set_permissions(&self, id: i64, permissions: HashSet<Permission>) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if let Some(user) = state.users.get_mut(&id) {
            user.permissions = Json(permissions);
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn set_active(&self, id: i64, is_active: bool) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if let Some(user) = state.users.get_mut(&id) {
            user.is_active = is_active;
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn attach_federation_id(&self, id: i64, federation_id: &str) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if state
            .users
            .values()
            .any(|u| u.id != id && u.federation_id.as_deref() == Some(federation_id))
        {
            return Err(AppError::duplicate_identity(
                "Federation id already linked to another account",
            ));
        }
        if let Some(user) = state.users.get_mut(&id) {
            user.federation_id = Some(federation_id.to_string());
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn mark_email_verified(&self, id: i64) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if let Some(user) = state.users.get_mut(&id) {
            user.is_email_verified = true;
            user.email_verification_token_hash = None;
            user.email_verification_expires_at = None;
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn set_reset_token(
        &self,
        id: i64,
        hash: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if let Some(user) = state.users.get_mut(&id) {
            user.reset_token_hash = Some(hash.to_string());
            user.reset_token_expires_at = Some(expires_at);
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn touch_last_login(&self, id: i64, at: DateTime<Utc>) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if let Some(user) = state.users.get_mut(&id) {
            user.last_login_at = Some(at);
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        Ok(self.state.lock().await.users.remove(&id).is_some())
    }

    async fn stats(&self, recent_since: DateTime<Utc>) -> AppResult<UserStats> {
        let state = self.state.lock().await;
        let mut users_by_role: HashMap<UserRole, u64> = HashMap::new();
        for user in state.users.values() {
            *users_by_role.entry(user.role).or_insert(0) += 1;
        }
        Ok(UserStats {
            total_users: state.users.len() as u64,
            verified_users: state.users.values().filter(|u| u.is_email_verified).count() as u64,
            active_users: state.users.values().filter(|u| u.is_active).count() as u64,
            users_by_role,
            recent_registrations: state
                .users
                .values()
                .filter(|u| u.created_at >= recent_since)
                .count() as u64,
        })
    }
}

/// Internal state for the memory session store.
#[derive(Debug, Default)]
struct SessionTable {
    next_id: i64,
    sessions: HashMap<i64, Session>,
}

/// In-memory session store.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    state: Arc<Mutex<SessionTable>>,
}

impl MemorySessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, data: CreateSession) -> AppResult<Session> {
        let mut state = self.state.lock().await;
        state.next_id += 1;
        let session = Session {
            id: state.next_id,
            user_id: data.user_id,
            refresh_token_hash: data.refresh_token_hash,
            ip_address: data.ip_address,
            user_agent: data.user_agent,
            created_at: Utc::now(),
            expires_at: data.expires_at,
        };
        state.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn find_by_refresh_token_hash(&self, hash: &str) -> AppResult<Option<Session>> {
        let now = Utc::now();
        Ok(self
            .state
            .lock()
            .await
            .sessions
            .values()
            .find(|s| s.refresh_token_hash == hash && !s.is_expired(now))
            .cloned())
    }

    async fn revoke_all_for_user(&self, user_id: i64) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        let before = state.sessions.len();
        state.sessions.retain(|_, s| s.user_id != user_id);
        Ok((before - state.sessions.len()) as u64)
    }

    async fn revoke_by_refresh_token_hash(&self, hash: &str) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        let before = state.sessions.len();
        state.sessions.retain(|_, s| s.refresh_token_hash != hash);
        Ok(state.sessions.len() < before)
    }

    async fn delete_expired(&self) -> AppResult<u64> {
        let now = Utc::now();
        let mut state = self.state.lock().await;
        let before = state.sessions.len();
        state.sessions.retain(|_, s| !s.is_expired(now));
        Ok((before - state.sessions.len()) as u64)
    }

    async fn count_active(&self) -> AppResult<u64> {
        let now = Utc::now();
        Ok(self
            .state
            .lock()
            .await
            .sessions
            .values()
            .filter(|s| !s.is_expired(now))
            .count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_user(email: &str) -> CreateUser {
        CreateUser {
            email: email.to_string(),
            name: "Test".to_string(),
            phone: None,
            password_hash: Some("$argon2id$stub".to_string()),
            federation_id: None,
            role: UserRole::User,
            permissions: [Permission::Read].into_iter().collect(),
            is_email_verified: false,
            email_verification_token_hash: None,
            email_verification_expires_at: None,
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryCredentialStore::new();
        store.create(new_user("a@x.com")).await.unwrap();
        let err = store.create(new_user("A@X.COM")).await.unwrap_err();
        assert_eq!(err.kind, keygate_core::ErrorKind::DuplicateIdentity);
    }

    #[tokio::test]
    async fn test_email_lookup_is_case_insensitive() {
        let store = MemoryCredentialStore::new();
        store.create(new_user("Mixed@Case.com")).await.unwrap();
        assert!(
            store
                .find_by_email("mixed@case.com")
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_expired_reset_token_not_found() {
        let store = MemoryCredentialStore::new();
        let user = store.create(new_user("r@x.com")).await.unwrap();
        store
            .set_reset_token(user.id, "deadbeef", Utc::now() - Duration::minutes(1))
            .await
            .unwrap();
        assert!(
            store
                .find_by_reset_token_hash("deadbeef")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_revoke_all_clears_only_that_user() {
        let store = MemorySessionStore::new();
        let expires = Utc::now() + Duration::days(7);
        for (user_id, hash) in [(1, "h1"), (1, "h2"), (2, "h3")] {
            store
                .create(CreateSession {
                    user_id,
                    refresh_token_hash: hash.to_string(),
                    expires_at: expires,
                    ip_address: None,
                    user_agent: None,
                })
                .await
                .unwrap();
        }

        assert_eq!(store.revoke_all_for_user(1).await.unwrap(), 2);
        assert!(
            store
                .find_by_refresh_token_hash("h1")
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            store
                .find_by_refresh_token_hash("h3")
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_expired_sessions_are_not_honored() {
        let store = MemorySessionStore::new();
        store
            .create(CreateSession {
                user_id: 1,
                refresh_token_hash: "old".to_string(),
                expires_at: Utc::now() - Duration::seconds(1),
                ip_address: None,
                user_agent: None,
            })
            .await
            .unwrap();

        assert!(
            store
                .find_by_refresh_token_hash("old")
                .await
                .unwrap()
                .is_none()
        );
        assert_eq!(store.delete_expired().await.unwrap(), 1);
    }
}
