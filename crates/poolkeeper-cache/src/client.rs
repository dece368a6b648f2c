//! Shared multiplexed cache client

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use poolkeeper_core::{BoxError, PoolError, PoolResult};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisResult};

use crate::backend::BACKEND_NAME;

/// Cheap, cloneable handle to the shared multiplexed connection.
///
/// Every clone talks over the same connection; there is nothing to release
/// per call. Each command is bounded by the endpoint's request timeout.
///
/// Closing the owning [`CachePool`](crate::CachePool) revokes every clone:
/// later commands fail with [`PoolError::NotConnected`], even after the pool
/// has been initialized again.
///
/// Text replies are decoded once here, so callers get `Option<String>`
/// rather than raw bytes.
#[derive(Clone)]
pub struct CacheClient {
	conn: ConnectionManager,
	address: Arc<str>,
	request_timeout: Duration,
	revoked: Arc<AtomicBool>,
}

impl CacheClient {
	pub(crate) fn new(conn: ConnectionManager, address: String, request_timeout: Duration) -> Self {
		Self {
			conn,
			address: address.into(),
			request_timeout,
			revoked: Arc::new(AtomicBool::new(false)),
		}
	}

	/// Whether the owning pool has been closed
	pub fn is_revoked(&self) -> bool {
		self.revoked.load(Ordering::Acquire)
	}

	/// Invalidate this handle and every clone of it.
	pub(crate) fn revoke(&self) {
		self.revoked.store(true, Ordering::Release);
	}

	fn ensure_open(&self) -> PoolResult<()> {
		if self.is_revoked() {
			return Err(PoolError::NotConnected {
				backend: BACKEND_NAME,
			});
		}
		Ok(())
	}

	/// `host:port` this client talks to
	pub fn address(&self) -> &str {
		&self.address
	}

	/// Raw connection for commands without a helper here.
	///
	/// Fails once the pool is closed. A connection taken earlier is not
	/// revoked and stays usable until dropped.
	///
	/// ```no_run
	/// use redis::AsyncCommands;
	///
	/// # async fn example(client: poolkeeper_cache::CacheClient) -> Result<(), Box<dyn std::error::Error>> {
	/// let mut conn = client.connection()?;
	/// let _: () = conn.expire("session:42", 60).await?;
	/// # Ok(())
	/// # }
	/// ```
	pub fn connection(&self) -> PoolResult<ConnectionManager> {
		self.ensure_open()?;
		Ok(self.conn.clone())
	}

	/// Send `PING` and return the decoded reply (normally `"PONG"`).
	pub async fn ping(&self) -> PoolResult<String> {
		self.ensure_open()?;
		self.raw_ping().await.map_err(|source| {
			tracing::error!(backend = BACKEND_NAME, endpoint = %self.address, error = %source, "health check failed");
			PoolError::HealthCheck {
				backend: BACKEND_NAME,
				endpoint: self.address.to_string(),
				source,
			}
		})
	}

	pub(crate) async fn raw_ping(&self) -> Result<String, BoxError> {
		let mut conn = self.conn.clone();
		self.bounded(redis::cmd("PING").query_async::<String>(&mut conn))
			.await
	}

	/// Value at `key` as text, `None` when absent.
	pub async fn get(&self, key: &str) -> PoolResult<Option<String>> {
		let mut conn = self.conn.clone();
		self.command("get", conn.get::<_, Option<String>>(key)).await
	}

	pub async fn get_bytes(&self, key: &str) -> PoolResult<Option<Vec<u8>>> {
		let mut conn = self.conn.clone();
		self.command("get", conn.get::<_, Option<Vec<u8>>>(key))
			.await
	}

	pub async fn set(&self, key: &str, value: impl redis::ToRedisArgs + Send + Sync) -> PoolResult<()> {
		let mut conn = self.conn.clone();
		self.command("set", conn.set::<_, _, ()>(key, value)).await
	}

	/// Remove `keys`, returning how many existed.
	pub async fn delete(&self, keys: &[&str]) -> PoolResult<usize> {
		self.ensure_open()?;
		if keys.is_empty() {
			return Ok(0);
		}
		let mut conn = self.conn.clone();
		self.command("delete", conn.del::<_, usize>(keys)).await
	}

	/// Atomically add `by` to the integer at `key` and return the new value.
	pub async fn incr(&self, key: &str, by: i64) -> PoolResult<i64> {
		let mut conn = self.conn.clone();
		self.command("incr", conn.incr::<_, _, i64>(key, by)).await
	}

	async fn command<T>(
		&self,
		operation: &'static str,
		fut: impl Future<Output = RedisResult<T>>,
	) -> PoolResult<T> {
		self.ensure_open()?;
		self.bounded(fut).await.map_err(|source| {
			tracing::error!(backend = BACKEND_NAME, operation, error = %source, "command failed");
			PoolError::query(BACKEND_NAME, operation, source)
		})
	}

	async fn bounded<T>(&self, fut: impl Future<Output = RedisResult<T>>) -> Result<T, BoxError> {
		match tokio::time::timeout(self.request_timeout, fut).await {
			Ok(reply) => reply.map_err(Into::into),
			Err(_) => Err(timed_out("command", self.request_timeout)),
		}
	}
}

impl fmt::Debug for CacheClient {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CacheClient")
			.field("address", &self.address)
			.field("request_timeout", &self.request_timeout)
			.field("revoked", &self.is_revoked())
			.finish_non_exhaustive()
	}
}

pub(crate) fn timed_out(what: &str, after: Duration) -> BoxError {
	Box::new(std::io::Error::new(
		std::io::ErrorKind::TimedOut,
		format!("{} timed out after {}ms", what, after.as_millis()),
	))
}
