//! # keygate-core
//!
//! Core crate for KeyGate. Contains the unified error system, configuration
//! schemas, and pagination types shared by every other crate.
//!
//! This crate has **no** internal dependencies on other KeyGate crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::{AppError, ErrorKind, Outward};
pub use result::AppResult;
