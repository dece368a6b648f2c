//! # poolkeeper-cache
//!
//! Valkey/Redis pool manager. One [`CachePool`] owns one multiplexed
//! `redis::aio::ConnectionManager`, verified with `PING` when initialized
//! and shared by every [`CacheClient`] handed out afterwards.
//!
//! Use [`CachePool::global`] for the process-wide instance or create and
//! pass around your own [`CachePool`]. [`with_cache_client`] runs an
//! operation against the current client and logs any error it returns.

pub mod backend;
pub mod client;
pub mod config;
pub mod pool;

pub use backend::RedisBackend;
pub use client::CacheClient;
pub use config::CacheEndpoint;
pub use pool::{CachePool, with_cache_client};

pub use redis::AsyncCommands;
