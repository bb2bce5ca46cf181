//! # keygate-service
//!
//! Business logic layer for KeyGate.
//!
//! Services compose the auth primitives and stores into the operations the
//! outer surface exposes: signup/login/refresh/logout, password recovery,
//! email verification, self-service profile management, and administration.

pub mod admin;
pub mod auth;
pub mod context;
pub mod email;
pub mod user;

pub use admin::{AdminService, DashboardStats, PermissionInfo};
pub use auth::{
    AuthService, AuthenticatedUser, FederatedLogin, FederatedOutcome, RefreshedAccess,
    SignupRequest,
};
pub use context::RequestContext;
pub use email::{EmailSender, LogMailer};
pub use user::UserService;
