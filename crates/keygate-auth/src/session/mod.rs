//! Refresh-token session registry.

pub mod registry;

pub use registry::{ClientInfo, SessionRegistry};
