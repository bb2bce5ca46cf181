//! Shared test harness: in-memory stores, a capturing mailer, and a static
//! federation provider.

// Each test binary uses a subset of the harness.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use keygate_auth::federation::{FederationProvider, VerifiedClaims};
use keygate_auth::session::{ClientInfo, SessionRegistry};
use keygate_core::config::auth::AuthConfig;
use keygate_core::error::AppError;
use keygate_core::result::AppResult;
use keygate_database::memory::{MemoryCredentialStore, MemorySessionStore};
use keygate_service::email::EmailSender;
use keygate_service::{AdminService, AuthService, SignupRequest, UserService};

/// What kind of email was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailKind {
    Verification,
    PasswordReset,
}

/// A captured outgoing email.
#[derive(Debug, Clone)]
pub struct SentMail {
    pub kind: MailKind,
    pub to: String,
    pub token: String,
}

/// Records outgoing emails so tests can pull the one-time tokens back out.
#[derive(Debug, Default)]
pub struct CapturingMailer {
    sent: Mutex<Vec<SentMail>>,
}

impl CapturingMailer {
    pub fn last_token(&self, kind: MailKind, to: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|m| m.kind == kind && m.to == to)
            .map(|m| m.token.clone())
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl EmailSender for CapturingMailer {
    async fn send_verification(&self, to: &str, _name: &str, token: &str) -> AppResult<()> {
        self.sent.lock().unwrap().push(SentMail {
            kind: MailKind::Verification,
            to: to.to_string(),
            token: token.to_string(),
        });
        Ok(())
    }

    async fn send_password_reset(&self, to: &str, _name: &str, token: &str) -> AppResult<()> {
        self.sent.lock().unwrap().push(SentMail {
            kind: MailKind::PasswordReset,
            to: to.to_string(),
            token: token.to_string(),
        });
        Ok(())
    }
}

/// Resolves a fixed set of assertions; everything else is rejected.
#[derive(Debug, Default)]
pub struct StaticFederation {
    assertions: HashMap<String, VerifiedClaims>,
}

impl StaticFederation {
    pub fn with(mut self, assertion: &str, subject: &str, email: &str, name: Option<&str>) -> Self {
        self.assertions.insert(
            assertion.to_string(),
            VerifiedClaims {
                subject: subject.to_string(),
                email: email.to_string(),
                name: name.map(String::from),
            },
        );
        self
    }
}

#[async_trait]
impl FederationProvider for StaticFederation {
    async fn resolve(&self, assertion: &str) -> AppResult<VerifiedClaims> {
        self.assertions
            .get(assertion)
            .cloned()
            .ok_or_else(|| AppError::federation("Assertion could not be verified"))
    }
}

/// Fully wired services over in-memory stores.
pub struct Harness {
    pub auth: AuthService,
    pub users: UserService,
    pub admin: AdminService,
    pub credentials: Arc<MemoryCredentialStore>,
    pub sessions: SessionRegistry,
    pub mailer: Arc<CapturingMailer>,
}

pub fn harness() -> Harness {
    harness_with(StaticFederation::default())
}

pub fn harness_with(federation: StaticFederation) -> Harness {
    let config = AuthConfig {
        jwt_secret: "integration-test-secret".to_string(),
        ..AuthConfig::default()
    };

    let credentials = Arc::new(MemoryCredentialStore::new());
    let sessions = SessionRegistry::new(Arc::new(MemorySessionStore::new()));
    let mailer = Arc::new(CapturingMailer::default());

    let auth = AuthService::new(
        credentials.clone(),
        sessions.clone(),
        Arc::new(federation),
        mailer.clone(),
        &config,
    );
    let users = UserService::new(credentials.clone(), sessions.clone(), &config);
    let admin = AdminService::new(credentials.clone(), sessions.clone());

    Harness {
        auth,
        users,
        admin,
        credentials,
        sessions,
        mailer,
    }
}

pub fn signup_request(email: &str, name: &str, password: &str) -> SignupRequest {
    SignupRequest {
        email: email.to_string(),
        name: name.to_string(),
        phone: None,
        password: password.to_string(),
    }
}

pub fn client() -> ClientInfo {
    ClientInfo {
        ip_address: Some("127.0.0.1".to_string()),
        user_agent: Some("keygate-tests".to_string()),
    }
}
