//! # keygate-database
//!
//! Storage abstractions and concrete implementations for KeyGate.
//!
//! The [`store`] module defines the `CredentialStore` and `SessionStore`
//! traits. Two backends are provided:
//!
//! - `repositories` — PostgreSQL via sqlx, for real deployments
//! - `memory` — tokio-mutex-guarded maps, for single-node/dev/test use

pub mod connection;
pub mod memory;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use store::{CredentialStore, SessionStore, UserStats};
