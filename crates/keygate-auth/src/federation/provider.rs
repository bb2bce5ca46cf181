//! Federation provider trait and verified claims.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use keygate_core::result::AppResult;

/// Identity facts vouched for by the federation provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifiedClaims {
    /// Subject identifier at the provider, stable across logins.
    pub subject: String,
    /// Verified email address.
    pub email: String,
    /// Display name, if the provider knows one.
    pub name: Option<String>,
}

/// Verifies identity assertions against the trusted federation provider.
#[async_trait]
pub trait FederationProvider: Send + Sync + 'static {
    /// Resolve an assertion into verified claims.
    ///
    /// Fails with `FederationVerification` if the assertion's signature or
    /// issuer cannot be validated.
    async fn resolve(&self, assertion: &str) -> AppResult<VerifiedClaims>;
}
