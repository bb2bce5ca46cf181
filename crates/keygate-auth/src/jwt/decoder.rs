//! Token validation and decoding.
//!
//! Decoding is pure computation: no store round-trip happens at this layer.
//! A signature-valid refresh token must still pass the session registry
//! before it is honored.

use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use keygate_core::config::auth::AuthConfig;
use keygate_core::error::{AppError, ErrorKind};

use super::claims::{Claims, TokenKind};

/// Validates and decodes bearer tokens.
#[derive(Clone)]
pub struct JwtDecoder {
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Validation configuration.
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        // No clock-skew leeway: a token minted with ttl=0 is already expired.
        validation.leeway = 0;

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Decodes and validates an access token string.
    pub fn decode_access_token(&self, token: &str) -> Result<Claims, AppError> {
        self.decode_token(token, TokenKind::Access)
    }

    /// Decodes and validates a refresh token string.
    pub fn decode_refresh_token(&self, token: &str) -> Result<Claims, AppError> {
        self.decode_token(token, TokenKind::Refresh)
    }

    /// Decode with signature, expiry, and kind checks.
    fn decode_token(&self, token: &str, expected: TokenKind) -> Result<Claims, AppError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                let kind = match e.kind() {
                    JwtErrorKind::ExpiredSignature => ErrorKind::TokenExpired,
                    JwtErrorKind::InvalidSignature => ErrorKind::TokenSignature,
                    JwtErrorKind::InvalidToken
                    | JwtErrorKind::Base64(_)
                    | JwtErrorKind::Json(_)
                    | JwtErrorKind::Utf8(_) => ErrorKind::TokenMalformed,
                    _ => ErrorKind::TokenSignature,
                };
                AppError::new(kind, format!("Token validation failed: {e}"))
            })?;

        let claims = token_data.claims;
        if claims.kind != expected {
            return Err(AppError::new(
                ErrorKind::TokenKindMismatch,
                match expected {
                    TokenKind::Access => "Expected an access token, got a refresh token",
                    TokenKind::Refresh => "Expected a refresh token, got an access token",
                },
            ));
        }

        Ok(claims)
    }
}
