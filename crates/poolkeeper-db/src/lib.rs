//! # poolkeeper-db
//!
//! PostgreSQL pool manager: one lazily created `sqlx::PgPool` per
//! [`DatabaseClient`], idempotent `connect`/`disconnect`, and query helpers
//! that borrow a connection for exactly one call.
//!
//! - [`DatabaseClient::execute_script`]: raw, possibly multi-statement SQL
//! - [`DatabaseClient::fetch_one`]: first row or `None`
//! - [`DatabaseClient::fetch_all`]: every row
//! - [`DatabaseClient::acquire`]: a [`ScopedConnection`] released on drop
//!
//! Query text and [`SqlValue`] arguments are passed to the server as-is;
//! no query building happens here.

pub mod backend;
pub mod client;
pub mod config;
pub mod value;

pub use backend::PostgresBackend;
pub use client::{DatabaseClient, ScopedConnection};
pub use config::{DatabaseEndpoint, DatabasePoolOptions, MIN_POOL_SIZE};
pub use value::{SqlType, SqlTyped, SqlValue};

pub use sqlx::Row;
pub use sqlx::postgres::PgRow;
