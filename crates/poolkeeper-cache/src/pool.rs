//! Process-wide cache pool manager

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use once_cell::sync::Lazy;
use poolkeeper_core::{PoolError, PoolLifecycle, PoolResult, PoolState};

use crate::backend::{BACKEND_NAME, RedisBackend};
use crate::client::CacheClient;
use crate::config::CacheEndpoint;

static GLOBAL: Lazy<CachePool> = Lazy::new(CachePool::new);

/// Owner of the shared [`CacheClient`].
///
/// Clones are handles to the same pool, so a `CachePool` can be passed to
/// collaborators instead of reaching for [`CachePool::global`].
///
/// # Examples
///
/// ```no_run
/// use poolkeeper_cache::{CacheEndpoint, CachePool};
/// use poolkeeper_core::PoolError;
///
/// # async fn example() -> Result<(), PoolError> {
/// let pool = CachePool::global();
/// pool.initialize(CacheEndpoint::new("localhost", 6379)).await?;
///
/// let hits = pool
///     .with_client(|client| async move { client.incr("hits", 1).await })
///     .await?;
/// assert!(hits >= 1);
///
/// pool.close().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CachePool {
	lifecycle: Arc<PoolLifecycle<RedisBackend>>,
}

impl CachePool {
	/// A standalone, uninitialized pool
	pub fn new() -> Self {
		Self {
			lifecycle: Arc::new(PoolLifecycle::new(RedisBackend)),
		}
	}

	/// The process-wide pool, created on first access and never recreated.
	///
	/// It is only torn down by an explicit [`CachePool::close`].
	pub fn global() -> &'static CachePool {
		&GLOBAL
	}

	/// Connect and verify with `PING`. A no-op when already connected to `endpoint`.
	pub async fn initialize(&self, endpoint: CacheEndpoint) -> PoolResult<()> {
		self.lifecycle.connect(endpoint).await
	}

	/// Drop the shared client. A no-op (with a warning) when not initialized.
	pub async fn close(&self) -> PoolResult<()> {
		self.lifecycle.disconnect().await
	}

	pub async fn get_client(&self) -> PoolResult<CacheClient> {
		self.lifecycle.pool().await
	}

	pub async fn ping(&self) -> PoolResult<String> {
		self.get_client().await?.ping().await
	}

	/// Run `f` with the current client.
	///
	/// Fails with [`PoolError::NotConnected`] before `f` runs when the pool is
	/// not initialized. An error from `f` is logged and returned unchanged.
	pub async fn with_client<F, Fut, T, E>(&self, f: F) -> Result<T, E>
	where
		F: FnOnce(CacheClient) -> Fut,
		Fut: Future<Output = Result<T, E>>,
		E: From<PoolError> + fmt::Display,
	{
		let client = match self.get_client().await {
			Ok(client) => client,
			Err(e) => {
				tracing::error!(backend = BACKEND_NAME, error = %e, "cache operation failed");
				return Err(e.into());
			}
		};

		let result = f(client).await;
		if let Err(e) = &result {
			tracing::error!(backend = BACKEND_NAME, error = %e, "cache operation failed");
		}
		result
	}

	pub async fn state(&self) -> PoolState {
		self.lifecycle.state().await
	}

	pub async fn is_connected(&self) -> bool {
		self.lifecycle.is_connected().await
	}

	pub async fn endpoint(&self) -> Option<CacheEndpoint> {
		self.lifecycle.endpoint().await
	}

	/// Whether both handles manage the same pool
	pub fn same_pool(&self, other: &CachePool) -> bool {
		Arc::ptr_eq(&self.lifecycle, &other.lifecycle)
	}
}

impl Default for CachePool {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Debug for CachePool {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CachePool").finish_non_exhaustive()
	}
}

/// Free-function form of [`CachePool::with_client`]
pub async fn with_cache_client<F, Fut, T, E>(pool: &CachePool, f: F) -> Result<T, E>
where
	F: FnOnce(CacheClient) -> Fut,
	Fut: Future<Output = Result<T, E>>,
	E: From<PoolError> + fmt::Display,
{
	pool.with_client(f).await
}
