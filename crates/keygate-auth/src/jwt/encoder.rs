//! Token creation with configurable signing and TTL.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};

use keygate_core::config::auth::AuthConfig;
use keygate_core::error::AppError;
use keygate_entity::user::User;

use super::claims::{Claims, TokenKind};

/// Creates signed access and refresh tokens.
///
/// The signing secret is taken from configuration at construction time and
/// never read from anywhere else.
#[derive(Clone)]
pub struct JwtEncoder {
    /// HMAC secret key for signing.
    encoding_key: EncodingKey,
    /// Access token TTL in minutes.
    access_ttl_minutes: i64,
    /// Refresh token TTL in days.
    refresh_ttl_days: i64,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder")
            .field("access_ttl_minutes", &self.access_ttl_minutes)
            .field("refresh_ttl_days", &self.refresh_ttl_days)
            .finish()
    }
}

/// Result of a successful token pair generation.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TokenPair {
    /// Short-lived access token.
    pub access_token: String,
    /// Long-lived refresh token.
    pub refresh_token: String,
    /// Access token expiration timestamp.
    pub access_expires_at: DateTime<Utc>,
    /// Refresh token expiration timestamp.
    pub refresh_expires_at: DateTime<Utc>,
}

impl JwtEncoder {
    /// Creates a new encoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            access_ttl_minutes: config.jwt_access_ttl_minutes as i64,
            refresh_ttl_days: config.jwt_refresh_ttl_days as i64,
        }
    }

    /// Generates a new access + refresh token pair for the given user.
    pub fn generate_token_pair(&self, user: &User) -> Result<TokenPair, AppError> {
        let (access_token, access_expires_at) =
            self.mint(user, TokenKind::Access, Duration::minutes(self.access_ttl_minutes))?;
        let (refresh_token, refresh_expires_at) =
            self.mint(user, TokenKind::Refresh, Duration::days(self.refresh_ttl_days))?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            access_expires_at,
            refresh_expires_at,
        })
    }

    /// Generates a standalone access token (e.g., after refresh).
    pub fn generate_access_token(&self, user: &User) -> Result<(String, DateTime<Utc>), AppError> {
        self.mint(user, TokenKind::Access, Duration::minutes(self.access_ttl_minutes))
    }

    /// Mints a single token of the given kind with an explicit TTL.
    pub(crate) fn mint(
        &self,
        user: &User,
        kind: TokenKind,
        ttl: Duration,
    ) -> Result<(String, DateTime<Utc>), AppError> {
        let expires_at = Utc::now() + ttl;

        let claims = Claims {
            sub: user.email.clone(),
            role: user.role,
            user_id: user.id,
            exp: expires_at.timestamp(),
            kind,
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode token: {e}")))?;

        Ok((token, expires_at))
    }
}
