//! # poolkeeper
//!
//! Idempotent lifecycle managers for pooled PostgreSQL and Valkey/Redis
//! clients.
//!
//! Each manager owns at most one pool, creates it on `connect` /
//! `initialize`, reuses it for every later call, and tears it down on an
//! explicit `disconnect` / `close`. Operations attempted while no pool is
//! open fail fast with [`PoolError::NotConnected`].
//!
//! ## Feature Flags
//!
//! - `db` - PostgreSQL manager ([`db::DatabaseClient`], via `sqlx`)
//! - `cache` - Valkey/Redis manager ([`cache::CachePool`], via `redis`)
//! - `test` - container fixtures for integration tests
//! - `full` (default) - `db` and `cache`
//!
//! ## Quick Example
//!
//! ```no_run
//! use poolkeeper::cache::{CacheEndpoint, CachePool};
//! use poolkeeper::db::{DatabaseClient, DatabaseEndpoint};
//! use poolkeeper::{Env, PoolResult};
//!
//! # async fn example() -> PoolResult<()> {
//! let env = Env::new();
//!
//! let db = DatabaseClient::new();
//! db.connect(DatabaseEndpoint::from_env(&env)?).await?;
//!
//! let cache = CachePool::global();
//! cache.initialize(CacheEndpoint::from_env(&env)?).await?;
//! assert_eq!(cache.ping().await?, "PONG");
//!
//! cache.close().await?;
//! db.disconnect().await?;
//! # Ok(())
//! # }
//! ```

pub use poolkeeper_core::*;

#[cfg(feature = "db")]
pub use poolkeeper_db as db;

#[cfg(feature = "cache")]
pub use poolkeeper_cache as cache;

#[cfg(feature = "test")]
pub use poolkeeper_test as test;
