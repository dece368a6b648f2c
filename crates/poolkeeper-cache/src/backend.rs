//! Valkey/Redis backend over a multiplexed `ConnectionManager`

use async_trait::async_trait;
use poolkeeper_core::{BoxError, PoolBackend};
use redis::aio::ConnectionManager;

use crate::client::{CacheClient, timed_out};
use crate::config::CacheEndpoint;

pub(crate) const BACKEND_NAME: &str = "Valkey";

/// Opens one multiplexed client per endpoint and checks it with `PING`
#[derive(Debug, Clone, Copy, Default)]
pub struct RedisBackend;

#[async_trait]
impl PoolBackend for RedisBackend {
	type Endpoint = CacheEndpoint;
	type Pool = CacheClient;

	fn name(&self) -> &'static str {
		BACKEND_NAME
	}

	async fn open(&self, endpoint: &CacheEndpoint) -> Result<CacheClient, BoxError> {
		let client = redis::Client::open(endpoint.to_url())?;
		let timeout = endpoint.request_timeout();

		let manager = tokio::time::timeout(timeout, ConnectionManager::new(client))
			.await
			.map_err(|_| timed_out("connect", timeout))??;

		Ok(CacheClient::new(manager, endpoint.address(), timeout))
	}

	async fn check_live(&self, client: &CacheClient) -> Result<Option<String>, BoxError> {
		client.raw_ping().await.map(Some)
	}

	async fn release(&self, client: CacheClient) -> Result<(), BoxError> {
		// Handed-out clones stop working now; the socket closes once the last
		// of them is dropped.
		client.revoke();
		drop(client);
		Ok(())
	}
}
