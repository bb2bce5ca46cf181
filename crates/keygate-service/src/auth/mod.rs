//! Credential issuance and session lifecycle.

pub mod service;

pub use service::{
    AuthService, AuthenticatedUser, FederatedLogin, FederatedOutcome, RefreshedAccess,
    SignupRequest,
};
