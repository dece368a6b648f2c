//! PostgreSQL pool manager

use std::sync::Arc;

use poolkeeper_core::{PoolError, PoolLifecycle, PoolResult, PoolState};
use sqlx::pool::PoolConnection;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres};

use crate::backend::{BACKEND_NAME, PostgresBackend};
use crate::config::{DatabaseEndpoint, DatabasePoolOptions};
use crate::value::SqlValue;

/// Checked-out connection, returned to the pool when dropped
pub type ScopedConnection = PoolConnection<Postgres>;

/// Manager owning at most one PostgreSQL pool.
///
/// Cloning yields another handle to the same pool.
///
/// # Examples
///
/// ```no_run
/// use poolkeeper_db::{DatabaseClient, DatabaseEndpoint, sql_args};
/// use poolkeeper_db::Row;
///
/// # async fn example() -> poolkeeper_core::PoolResult<()> {
/// let db = DatabaseClient::new();
/// db.connect(DatabaseEndpoint::new("localhost", 5432, "postgres", "postgres", "postgres"))
///     .await?;
///
/// db.execute_script("CREATE TABLE IF NOT EXISTS users (id INT PRIMARY KEY, name TEXT)")
///     .await?;
/// if let Some(row) = db.fetch_one("SELECT name FROM users WHERE id = $1", sql_args![1]).await? {
///     let name: String = row.get("name");
///     println!("{name}");
/// }
///
/// db.disconnect().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct DatabaseClient {
	lifecycle: Arc<PoolLifecycle<PostgresBackend>>,
}

impl DatabaseClient {
	/// Manager with [`DatabasePoolOptions::default`] (at least 2 connections)
	pub fn new() -> Self {
		Self {
			lifecycle: Arc::new(PoolLifecycle::new(PostgresBackend::default())),
		}
	}

	pub fn with_options(options: DatabasePoolOptions) -> PoolResult<Self> {
		options.validate()?;
		Ok(Self {
			lifecycle: Arc::new(PoolLifecycle::new(PostgresBackend::new(options))),
		})
	}

	pub fn options(&self) -> &DatabasePoolOptions {
		self.lifecycle.backend().options()
	}

	/// Create the pool. A no-op when already connected to `endpoint`.
	pub async fn connect(&self, endpoint: DatabaseEndpoint) -> PoolResult<()> {
		self.lifecycle.connect(endpoint).await
	}

	/// Close the pool. A no-op (with a warning) when not connected.
	pub async fn disconnect(&self) -> PoolResult<()> {
		self.lifecycle.disconnect().await
	}

	pub async fn state(&self) -> PoolState {
		self.lifecycle.state().await
	}

	pub async fn is_connected(&self) -> bool {
		self.lifecycle.is_connected().await
	}

	pub async fn endpoint(&self) -> Option<DatabaseEndpoint> {
		self.lifecycle.endpoint().await
	}

	/// Shared handle to the live pool
	pub async fn pool(&self) -> PoolResult<PgPool> {
		self.lifecycle.pool().await
	}

	/// Check a connection out of the pool.
	///
	/// The connection goes back to the pool when the returned value is
	/// dropped, whether the caller finishes, fails, or is cancelled.
	pub async fn acquire(&self) -> PoolResult<ScopedConnection> {
		let pool = self.pool().await?;
		let conn = pool.acquire().await.map_err(|e| {
			tracing::error!(backend = BACKEND_NAME, operation = "acquire", error = %e, "failed to acquire connection");
			PoolError::query(BACKEND_NAME, "acquire", e)
		})?;
		tracing::debug!(
			backend = BACKEND_NAME,
			size = pool.size(),
			idle = pool.num_idle(),
			"connection acquired"
		);
		Ok(conn)
	}

	/// Run raw SQL, possibly several `;`-separated statements, without arguments.
	pub async fn execute_script(&self, sql: &str) -> PoolResult<()> {
		let mut conn = self.acquire().await?;
		sqlx::raw_sql(sql)
			.execute(&mut *conn)
			.await
			.map_err(|e| query_failed("execute_script", e))?;
		Ok(())
	}

	/// First row of `query`, or `None` when nothing matches.
	///
	/// A bare [`SqlValue::Null`] argument is text-typed; use `None::<T>` or
	/// [`SqlValue::TypedNull`] for `NULL`s in non-text positions.
	pub async fn fetch_one(
		&self,
		query: &str,
		args: impl IntoIterator<Item = SqlValue>,
	) -> PoolResult<Option<PgRow>> {
		let mut conn = self.acquire().await?;
		bind_all(query, args)
			.fetch_optional(&mut *conn)
			.await
			.map_err(|e| query_failed("fetch_one", e))
	}

	pub async fn fetch_all(
		&self,
		query: &str,
		args: impl IntoIterator<Item = SqlValue>,
	) -> PoolResult<Vec<PgRow>> {
		let mut conn = self.acquire().await?;
		bind_all(query, args)
			.fetch_all(&mut *conn)
			.await
			.map_err(|e| query_failed("fetch_all", e))
	}
}

impl Default for DatabaseClient {
	fn default() -> Self {
		Self::new()
	}
}

fn bind_all<'q>(
	query: &'q str,
	args: impl IntoIterator<Item = SqlValue>,
) -> sqlx::query::Query<'q, Postgres, sqlx::postgres::PgArguments> {
	args.into_iter()
		.fold(sqlx::query(query), |query, arg| arg.bind(query))
}

fn query_failed(operation: &'static str, error: sqlx::Error) -> PoolError {
	tracing::error!(backend = BACKEND_NAME, operation, error = %error, "query failed");
	PoolError::query(BACKEND_NAME, operation, error)
}
