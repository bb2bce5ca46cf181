//! Role-based access control: role-to-permission policies and the
//! authorization decision engine.

pub mod engine;
pub mod policies;

pub use engine::AuthorizationEngine;
pub use policies::RolePolicies;
