//! sqlx-backed PostgreSQL pool backend

use async_trait::async_trait;
use poolkeeper_core::{BoxError, PoolBackend};
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

use crate::config::{DatabaseEndpoint, DatabasePoolOptions};

pub(crate) const BACKEND_NAME: &str = "PostgreSQL";

/// Opens and closes `sqlx::PgPool`s
#[derive(Debug, Clone, Default)]
pub struct PostgresBackend {
	options: DatabasePoolOptions,
}

impl PostgresBackend {
	pub fn new(options: DatabasePoolOptions) -> Self {
		Self { options }
	}

	pub fn options(&self) -> &DatabasePoolOptions {
		&self.options
	}
}

#[async_trait]
impl PoolBackend for PostgresBackend {
	type Endpoint = DatabaseEndpoint;
	type Pool = PgPool;

	fn name(&self) -> &'static str {
		BACKEND_NAME
	}

	async fn open(&self, endpoint: &DatabaseEndpoint) -> Result<PgPool, BoxError> {
		let mut connect_options = PgConnectOptions::new()
			.host(endpoint.host.trim_start_matches('[').trim_end_matches(']'))
			.port(endpoint.port)
			.database(&endpoint.database)
			.username(&endpoint.user);
		if !endpoint.password.is_empty() {
			connect_options = connect_options.password(&endpoint.password);
		}

		// `connect_with` checks out one connection before returning, so an
		// unreachable server fails here rather than on first use.
		let pool = PgPoolOptions::new()
			.min_connections(self.options.min_connections)
			.max_connections(self.options.max_connections)
			.acquire_timeout(self.options.acquire_timeout)
			.connect_with(connect_options)
			.await?;

		Ok(pool)
	}

	async fn release(&self, pool: PgPool) -> Result<(), BoxError> {
		let timeout = self.options.close_timeout;
		if tokio::time::timeout(timeout, pool.close()).await.is_err() {
			return Err(format!(
				"connections still checked out after {}s; the pool is dropped regardless",
				timeout.as_secs()
			)
			.into());
		}
		Ok(())
	}
}
