//! # keygate-entity
//!
//! Domain entities for KeyGate: user identities, the fixed permission
//! registry, and refresh-token sessions.

pub mod permission;
pub mod session;
pub mod user;

pub use permission::Permission;
pub use session::Session;
pub use user::{User, UserRole};
