//! Administrative user management.

pub mod service;

pub use service::{AdminService, DashboardStats, PermissionInfo};
