//! Federation provider configuration.

use serde::{Deserialize, Serialize};

/// Settings for the external identity federation provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FederationConfig {
    /// Whether federated login is enabled at all.
    #[serde(default)]
    pub enabled: bool,
    /// Endpoint that verifies an identity assertion and returns claims.
    #[serde(default = "default_verify_url")]
    pub verify_url: String,
    /// Expected issuer of accepted assertions.
    #[serde(default)]
    pub issuer: Option<String>,
    /// Request timeout in seconds for provider calls.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for FederationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            verify_url: default_verify_url(),
            issuer: None,
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_verify_url() -> String {
    "http://localhost:9000/verify".to_string()
}

fn default_timeout() -> u64 {
    5
}
