//! # poolkeeper-core
//!
//! Shared building blocks for the poolkeeper pool managers.
//!
//! - **Lifecycle engine** ([`PoolLifecycle`]): create-once, idempotent
//!   connect/disconnect and the "connected" precondition, generic over a
//!   [`PoolBackend`]
//! - **Error taxonomy** ([`PoolError`]): connection, not-connected, teardown,
//!   health-check and query failures
//! - **Endpoints** ([`Endpoint`]): credential-safe addressing for logs and errors
//! - **Environment configuration** ([`env::Env`])
//!
//! The engine never talks to the network itself. Everything backend-specific
//! lives behind [`PoolBackend`], implemented by `poolkeeper-db` (PostgreSQL)
//! and `poolkeeper-cache` (Valkey/Redis).

pub mod endpoint;
pub mod env;
pub mod error;
pub mod lifecycle;

pub use endpoint::{Endpoint, host_port, mask_url_password};
pub use env::{Env, EnvLookup};
pub use error::{BoxError, PoolError, PoolResult};
pub use lifecycle::{PoolBackend, PoolLifecycle, PoolState};

/// Re-export commonly used types
pub mod prelude {
	pub use super::endpoint::*;
	pub use super::env::*;
	pub use super::error::*;
	pub use super::lifecycle::*;
}
