//! Identity federation adapter.
//!
//! Exchanges an externally-issued identity assertion for verified claims.
//! The provider is an external trust anchor; its output is treated as
//! ground truth once returned successfully.

pub mod http;
pub mod provider;

pub use http::HttpFederationProvider;
pub use provider::{FederationProvider, VerifiedClaims};
