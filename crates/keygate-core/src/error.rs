//! Unified application error types for KeyGate.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. The fine-grained [`ErrorKind`] is kept
//! for logging and tests; the caller-facing signal is deliberately coarsened
//! through [`ErrorKind::outward`] so that authentication failures never reveal
//! which specific check rejected the request.

use std::fmt;
use thiserror::Error;

/// Fine-grained error categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The requested resource was not found.
    NotFound,
    /// Unknown email or wrong password. One kind for both, on purpose.
    InvalidCredentials,
    /// The account exists but has been deactivated.
    AccountDisabled,
    /// The federation provider rejected the identity assertion.
    FederationVerification,
    /// A bearer token was structurally invalid.
    TokenMalformed,
    /// A bearer token's signature did not verify.
    TokenSignature,
    /// A bearer token was past its expiry.
    TokenExpired,
    /// An access token was presented where a refresh token was expected, or vice versa.
    TokenKindMismatch,
    /// A signature-valid refresh token whose session is no longer registered.
    SessionRevoked,
    /// The caller is authenticated but lacks the required role or permission.
    InsufficientPermission,
    /// An identity with the same email already exists.
    DuplicateIdentity,
    /// A one-time verification or reset token was absent or expired.
    InvalidOrExpiredToken,
    /// A password failed the strength policy.
    WeakPassword,
    /// Input validation failed.
    Validation,
    /// A database error occurred.
    Database,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An external service error occurred.
    ExternalService,
    /// An internal server error occurred.
    Internal,
}

/// The coarse outward signal reported to callers.
///
/// Everything authentication-shaped collapses to [`Outward::Unauthenticated`];
/// authorization failures stay distinct because the caller *is* authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Outward {
    /// The caller could not be authenticated. No further detail is exposed.
    Unauthenticated,
    /// The caller is authenticated but not allowed.
    Forbidden,
    /// The request itself was invalid.
    InvalidInput,
    /// The request conflicts with existing state.
    Conflict,
    /// The referenced resource does not exist.
    NotFound,
    /// Storage or a dependency is down; the whole service degrades.
    Unavailable,
    /// Unexpected internal failure.
    Internal,
}

impl ErrorKind {
    /// Coarsen this kind to its outward signal.
    pub fn outward(&self) -> Outward {
        match self {
            Self::InvalidCredentials
            | Self::AccountDisabled
            | Self::FederationVerification
            | Self::TokenMalformed
            | Self::TokenSignature
            | Self::TokenExpired
            | Self::TokenKindMismatch
            | Self::SessionRevoked => Outward::Unauthenticated,
            Self::InsufficientPermission => Outward::Forbidden,
            Self::Validation | Self::WeakPassword | Self::InvalidOrExpiredToken => {
                Outward::InvalidInput
            }
            Self::DuplicateIdentity => Outward::Conflict,
            Self::NotFound => Outward::NotFound,
            Self::Database | Self::ExternalService => Outward::Unavailable,
            Self::Configuration | Self::Serialization | Self::Internal => Outward::Internal,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::InvalidCredentials => write!(f, "INVALID_CREDENTIALS"),
            Self::AccountDisabled => write!(f, "ACCOUNT_DISABLED"),
            Self::FederationVerification => write!(f, "FEDERATION_VERIFICATION"),
            Self::TokenMalformed => write!(f, "TOKEN_MALFORMED"),
            Self::TokenSignature => write!(f, "TOKEN_SIGNATURE"),
            Self::TokenExpired => write!(f, "TOKEN_EXPIRED"),
            Self::TokenKindMismatch => write!(f, "TOKEN_KIND_MISMATCH"),
            Self::SessionRevoked => write!(f, "SESSION_REVOKED"),
            Self::InsufficientPermission => write!(f, "INSUFFICIENT_PERMISSION"),
            Self::DuplicateIdentity => write!(f, "DUPLICATE_IDENTITY"),
            Self::InvalidOrExpiredToken => write!(f, "INVALID_OR_EXPIRED_TOKEN"),
            Self::WeakPassword => write!(f, "WEAK_PASSWORD"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Database => write!(f, "DATABASE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::ExternalService => write!(f, "EXTERNAL_SERVICE"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified application error used throughout KeyGate.
///
/// All crate-specific errors are mapped into `AppError` using `From` impls
/// or explicit `.map_err()` calls.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message. Safe to log, not guaranteed safe to
    /// return to unauthenticated callers — use [`ErrorKind::outward`] for that.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Coarse outward signal for this error.
    pub fn outward(&self) -> Outward {
        self.kind.outward()
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create an invalid-credentials error with the uniform message.
    pub fn invalid_credentials() -> Self {
        Self::new(ErrorKind::InvalidCredentials, "Incorrect email or password")
    }

    /// Create an account-disabled error.
    pub fn account_disabled() -> Self {
        Self::new(ErrorKind::AccountDisabled, "Account is disabled")
    }

    /// Create a federation verification error.
    pub fn federation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::FederationVerification, message)
    }

    /// Create a session-revoked error.
    pub fn session_revoked() -> Self {
        Self::new(ErrorKind::SessionRevoked, "Session is revoked or expired")
    }

    /// Create an insufficient-permission error.
    pub fn insufficient_permission(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InsufficientPermission, message)
    }

    /// Create a duplicate-identity error.
    pub fn duplicate_identity(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DuplicateIdentity, message)
    }

    /// Create an invalid-or-expired one-time token error.
    pub fn invalid_or_expired_token(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidOrExpiredToken, message)
    }

    /// Create a weak-password error.
    pub fn weak_password(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::WeakPassword, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an external-service error.
    pub fn external_service(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ExternalService, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}
