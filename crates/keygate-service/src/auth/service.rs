//! The core authentication service.
//!
//! Orchestrates credential checks, token minting, session registration, and
//! one-time token flows. Every failure on the login path surfaces as the same
//! `InvalidCredentials` error so that callers cannot distinguish an unknown
//! email from a wrong password.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use validator::Validate;

use keygate_auth::federation::FederationProvider;
use keygate_auth::jwt::{JwtDecoder, JwtEncoder, TokenPair};
use keygate_auth::onetime::{self, OneTimeToken};
use keygate_auth::password::{PasswordHasher, PasswordValidator};
use keygate_auth::rbac::AuthorizationEngine;
use keygate_auth::session::{ClientInfo, SessionRegistry};
use keygate_core::config::auth::AuthConfig;
use keygate_core::error::AppError;
use keygate_core::result::AppResult;
use keygate_database::store::CredentialStore;
use keygate_entity::user::{CreateUser, User, UserRole};

use crate::context::RequestContext;
use crate::email::EmailSender;

/// Data required to register a new account.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SignupRequest {
    /// Email address, also the login identifier.
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    /// Display name.
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: String,
    /// Phone number (optional).
    pub phone: Option<String>,
    /// Plaintext password, validated against the strength policy.
    pub password: String,
}

/// A user together with their freshly minted token pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// The authenticated account.
    pub user: User,
    /// Access and refresh tokens.
    pub tokens: TokenPair,
}

/// How a federated login resolved to a local account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FederatedOutcome {
    /// A new account was created from the provider's claims.
    Created,
    /// An existing password account was linked to the federated identity.
    Linked,
    /// The federated identity was already linked.
    Found,
}

/// Result of a federated login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FederatedLogin {
    /// How the local account was resolved.
    pub outcome: FederatedOutcome,
    /// The resolved account.
    pub user: User,
    /// Access and refresh tokens.
    pub tokens: TokenPair,
}

/// A standalone access token minted through the refresh flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshedAccess {
    /// The new access token.
    pub access_token: String,
    /// Its expiry.
    pub expires_at: DateTime<Utc>,
}

/// Handles signup, login, federated login, refresh, logout, password
/// recovery, and email verification.
#[derive(Clone)]
pub struct AuthService {
    /// User identity store.
    credentials: Arc<dyn CredentialStore>,
    /// Refresh-token session registry.
    sessions: SessionRegistry,
    /// Token minting.
    encoder: JwtEncoder,
    /// Token verification.
    decoder: JwtDecoder,
    /// Argon2id hashing.
    hasher: PasswordHasher,
    /// Strength policy.
    policy: PasswordValidator,
    /// Role/permission resolution.
    engine: AuthorizationEngine,
    /// External identity provider.
    federation: Arc<dyn FederationProvider>,
    /// Outbound email.
    mailer: Arc<dyn EmailSender>,
    /// Email verification token lifetime.
    verification_ttl: Duration,
    /// Password reset token lifetime.
    reset_ttl: Duration,
}

impl AuthService {
    /// Creates a new authentication service.
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        sessions: SessionRegistry,
        federation: Arc<dyn FederationProvider>,
        mailer: Arc<dyn EmailSender>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            credentials,
            sessions,
            encoder: JwtEncoder::new(config),
            decoder: JwtDecoder::new(config),
            hasher: PasswordHasher::new(),
            policy: PasswordValidator::new(config),
            engine: AuthorizationEngine::new(),
            federation,
            mailer,
            verification_ttl: Duration::hours(config.verification_token_ttl_hours as i64),
            reset_ttl: Duration::minutes(config.reset_token_ttl_minutes as i64),
        }
    }

    /// Registers a new password account and logs it in.
    ///
    /// The account is created before any token is minted, so a failed
    /// signup never leaves credentials issued for a user that does not
    /// exist. Fails with `DuplicateIdentity` if the email is taken.
    pub async fn signup(
        &self,
        req: SignupRequest,
        client: &ClientInfo,
    ) -> AppResult<AuthenticatedUser> {
        req.validate()
            .map_err(|e| AppError::validation(e.to_string()))?;
        self.policy.validate(&req.password)?;

        let password_hash = self.hasher.hash_password(&req.password)?;
        let verification = OneTimeToken::generate();
        let role = UserRole::default();

        let user = self
            .credentials
            .create(CreateUser {
                email: req.email.to_lowercase(),
                name: req.name,
                phone: req.phone,
                password_hash: Some(password_hash),
                federation_id: None,
                role,
                permissions: self.engine.policies().defaults_for(role),
                is_email_verified: false,
                email_verification_token_hash: Some(verification.hash),
                email_verification_expires_at: Some(Utc::now() + self.verification_ttl),
            })
            .await?;

        if let Err(err) = self
            .mailer
            .send_verification(&user.email, &user.name, &verification.plaintext)
            .await
        {
            warn!(user_id = user.id, error = %err, "Failed to send verification email");
        }

        let tokens = self.issue_session(&user, client).await?;
        info!(user_id = user.id, "User signed up");

        Ok(AuthenticatedUser { user, tokens })
    }

    /// Authenticates email and password, returning a fresh token pair.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        client: &ClientInfo,
    ) -> AppResult<AuthenticatedUser> {
        let mut user = self
            .credentials
            .find_by_email(email)
            .await?
            .ok_or_else(AppError::invalid_credentials)?;

        // Federated-only accounts have no password to check.
        let hash = user
            .password_hash
            .as_deref()
            .ok_or_else(AppError::invalid_credentials)?;
        if !self.hasher.verify_password(password, hash)? {
            return Err(AppError::invalid_credentials());
        }

        if !user.is_active {
            return Err(AppError::account_disabled());
        }

        let now = Utc::now();
        self.credentials.touch_last_login(user.id, now).await?;
        user.last_login_at = Some(now);

        let tokens = self.issue_session(&user, client).await?;
        info!(user_id = user.id, "User logged in");

        Ok(AuthenticatedUser { user, tokens })
    }

    /// Logs in through the federation provider.
    ///
    /// Resolution order: an account already linked to the federated subject
    /// is used as-is; otherwise an account with the same verified email is
    /// linked; otherwise a new passwordless account is created.
    pub async fn federated_login(
        &self,
        assertion: &str,
        client: &ClientInfo,
    ) -> AppResult<FederatedLogin> {
        let claims = self.federation.resolve(assertion).await?;

        let (outcome, mut user) = if let Some(user) = self
            .credentials
            .find_by_federation_id(&claims.subject)
            .await?
        {
            (FederatedOutcome::Found, user)
        } else if let Some(mut user) = self.credentials.find_by_email(&claims.email).await? {
            self.credentials
                .attach_federation_id(user.id, &claims.subject)
                .await?;
            user.federation_id = Some(claims.subject.clone());
            (FederatedOutcome::Linked, user)
        } else {
            let role = UserRole::default();
            let name = claims.name.clone().unwrap_or_else(|| {
                claims.email.split('@').next().unwrap_or("").to_string()
            });
            let user = self
                .credentials
                .create(CreateUser {
                    email: claims.email.to_lowercase(),
                    name,
                    phone: None,
                    password_hash: None,
                    federation_id: Some(claims.subject.clone()),
                    role,
                    permissions: self.engine.policies().defaults_for(role),
                    // The provider vouches for the email.
                    is_email_verified: true,
                    email_verification_token_hash: None,
                    email_verification_expires_at: None,
                })
                .await?;
            (FederatedOutcome::Created, user)
        };

        if !user.is_active {
            return Err(AppError::account_disabled());
        }

        let now = Utc::now();
        self.credentials.touch_last_login(user.id, now).await?;
        user.last_login_at = Some(now);

        let tokens = self.issue_session(&user, client).await?;
        info!(user_id = user.id, ?outcome, "Federated login");

        Ok(FederatedLogin {
            outcome,
            user,
            tokens,
        })
    }

    /// Exchanges a live refresh token for a new access token.
    ///
    /// The refresh token itself is not rotated; it stays valid until its
    /// session is revoked or expires.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<RefreshedAccess> {
        let claims = self.decoder.decode_refresh_token(refresh_token)?;
        let session = self.sessions.validate(refresh_token).await?;

        if session.user_id != claims.user_id {
            return Err(AppError::session_revoked());
        }

        let user = self
            .credentials
            .find_by_id(claims.user_id)
            .await?
            .ok_or_else(AppError::session_revoked)?;
        if !user.is_active {
            return Err(AppError::account_disabled());
        }

        let (access_token, expires_at) = self.encoder.generate_access_token(&user)?;
        debug!(user_id = user.id, "Access token refreshed");

        Ok(RefreshedAccess {
            access_token,
            expires_at,
        })
    }

    /// Logs out by revoking every session of the calling user.
    ///
    /// Returns the number of sessions revoked.
    pub async fn logout(&self, access_token: &str) -> AppResult<u64> {
        let claims = self.decoder.decode_access_token(access_token)?;
        let revoked = self.sessions.revoke_all(claims.user_id).await?;
        info!(user_id = claims.user_id, revoked, "User logged out");
        Ok(revoked)
    }

    /// Starts the password recovery flow.
    ///
    /// Always succeeds, whether or not the email is registered, so the
    /// endpoint cannot be used to probe for accounts.
    pub async fn forgot_password(&self, email: &str) -> AppResult<()> {
        let Some(user) = self.credentials.find_by_email(email).await? else {
            debug!("Password reset requested for unknown email");
            return Ok(());
        };
        if user.password_hash.is_none() || !user.is_active {
            debug!(user_id = user.id, "Password reset skipped");
            return Ok(());
        }

        let reset = OneTimeToken::generate();
        self.credentials
            .set_reset_token(user.id, &reset.hash, Utc::now() + self.reset_ttl)
            .await?;

        if let Err(err) = self
            .mailer
            .send_password_reset(&user.email, &user.name, &reset.plaintext)
            .await
        {
            warn!(user_id = user.id, error = %err, "Failed to send reset email");
        }

        info!(user_id = user.id, "Password reset token issued");
        Ok(())
    }

    /// Completes the password recovery flow with a one-time reset token.
    ///
    /// Revokes every session of the user: whoever requested the reset is
    /// locking out anyone holding the old credentials.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> AppResult<()> {
        let user = self
            .credentials
            .find_by_reset_token_hash(&onetime::hash_token(token))
            .await?
            .ok_or_else(|| {
                AppError::invalid_or_expired_token("Reset token is invalid or expired")
            })?;

        self.policy.validate(new_password)?;
        let hash = self.hasher.hash_password(new_password)?;

        self.credentials.update_password(user.id, &hash).await?;
        let revoked = self.sessions.revoke_all(user.id).await?;

        info!(user_id = user.id, revoked, "Password reset completed");
        Ok(())
    }

    /// Marks an email address verified using a one-time verification token.
    pub async fn verify_email(&self, token: &str) -> AppResult<User> {
        let mut user = self
            .credentials
            .find_by_verification_token_hash(&onetime::hash_token(token))
            .await?
            .ok_or_else(|| {
                AppError::invalid_or_expired_token("Verification token is invalid or expired")
            })?;

        self.credentials.mark_email_verified(user.id).await?;
        user.is_email_verified = true;
        user.email_verification_token_hash = None;
        user.email_verification_expires_at = None;

        info!(user_id = user.id, "Email verified");
        Ok(user)
    }

    /// Resolves an access token into a request context.
    ///
    /// Role and permissions come from the store, not from the token, so a
    /// role change takes effect on the next request rather than at the next
    /// token refresh.
    pub async fn authenticate(&self, access_token: &str) -> AppResult<RequestContext> {
        let claims = self.decoder.decode_access_token(access_token)?;

        let user = self
            .credentials
            .find_by_id(claims.user_id)
            .await?
            .ok_or_else(AppError::invalid_credentials)?;
        if !user.is_active {
            return Err(AppError::account_disabled());
        }

        let permissions = self
            .engine
            .effective_permissions(user.role, user.explicit_permissions());

        Ok(RequestContext::new(
            user.id,
            user.email,
            user.role,
            permissions,
        ))
    }

    /// Mints a token pair and registers its refresh session.
    async fn issue_session(&self, user: &User, client: &ClientInfo) -> AppResult<TokenPair> {
        let tokens = self.encoder.generate_token_pair(user)?;
        self.sessions
            .register(
                user.id,
                &tokens.refresh_token,
                tokens.refresh_expires_at,
                client,
            )
            .await?;
        Ok(tokens)
    }
}
