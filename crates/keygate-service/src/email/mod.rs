//! Outbound email for verification and password-reset links.
//!
//! Delivery is a collaborator behind a trait so that the services stay
//! testable and a real transport can be slotted in later. Delivery failures
//! are logged by the caller and never fail the triggering operation.

use async_trait::async_trait;
use tracing::info;

use keygate_core::config::email::EmailConfig;
use keygate_core::result::AppResult;

/// Sends account lifecycle emails.
#[async_trait]
pub trait EmailSender: Send + Sync + 'static {
    /// Send an email verification link carrying a one-time token.
    async fn send_verification(&self, to: &str, name: &str, token: &str) -> AppResult<()>;

    /// Send a password reset link carrying a one-time token.
    async fn send_password_reset(&self, to: &str, name: &str, token: &str) -> AppResult<()>;
}

/// Logs outgoing emails instead of delivering them.
///
/// The default sender for development and single-node deployments without
/// an SMTP relay.
#[derive(Debug, Clone)]
pub struct LogMailer {
    config: EmailConfig,
}

impl LogMailer {
    /// Creates a mailer that logs messages using the given configuration.
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl EmailSender for LogMailer {
    async fn send_verification(&self, to: &str, name: &str, token: &str) -> AppResult<()> {
        let link = format!("{}/verify-email?token={token}", self.config.frontend_url);
        info!(
            from = %self.config.from_address,
            to,
            name,
            link,
            "Verification email (log transport)"
        );
        Ok(())
    }

    async fn send_password_reset(&self, to: &str, name: &str, token: &str) -> AppResult<()> {
        let link = format!("{}/reset-password?token={token}", self.config.frontend_url);
        info!(
            from = %self.config.from_address,
            to,
            name,
            link,
            "Password reset email (log transport)"
        );
        Ok(())
    }
}
