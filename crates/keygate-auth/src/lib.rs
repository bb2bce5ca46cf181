//! # keygate-auth
//!
//! Authentication primitives for KeyGate.
//!
//! ## Modules
//!
//! - `jwt` — bearer token minting and verification (HS256)
//! - `password` — Argon2id password hashing and strength policy
//! - `onetime` — random one-time tokens for email verification and resets
//! - `rbac` — role/permission policies and the authorization engine
//! - `federation` — external identity provider adapter
//! - `session` — refresh-token session registry

pub mod federation;
pub mod jwt;
pub mod onetime;
pub mod password;
pub mod rbac;
pub mod session;

pub use federation::{FederationProvider, VerifiedClaims};
pub use jwt::{Claims, JwtDecoder, JwtEncoder, TokenKind, TokenPair};
pub use onetime::OneTimeToken;
pub use password::{PasswordHasher, PasswordValidator};
pub use rbac::{AuthorizationEngine, RolePolicies};
pub use session::{ClientInfo, SessionRegistry};
