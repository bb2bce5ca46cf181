//! Outbound email configuration.

use serde::{Deserialize, Serialize};

/// Settings for verification and password-reset emails.
///
/// Actual delivery is an external collaborator behind the `EmailSender`
/// trait; this only configures the message envelope and link targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// Whether outbound email is enabled.
    #[serde(default)]
    pub enabled: bool,
    /// From address used on outgoing messages.
    #[serde(default = "default_from")]
    pub from_address: String,
    /// Base URL of the frontend, used to build verification/reset links.
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            from_address: default_from(),
            frontend_url: default_frontend_url(),
        }
    }
}

fn default_from() -> String {
    "no-reply@keygate.local".to_string()
}

fn default_frontend_url() -> String {
    "http://localhost:3000".to_string()
}
