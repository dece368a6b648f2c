//! Pool lifecycle engine
//!
//! [`PoolLifecycle`] owns at most one live pool produced by a [`PoolBackend`]
//! and moves it through `Uninitialized -> Connected -> Closed`.
//!
//! - `connect` while connected to the same endpoint is a logged no-op
//! - `disconnect` while not connected is a logged no-op
//! - [`PoolLifecycle::pool`] fails with [`PoolError::NotConnected`] unless connected
//!
//! State transitions hold the write lock for the whole check-then-create
//! (or take-then-release) sequence, so two concurrent first callers never
//! open two pools. Data operations only hold the read lock long enough to
//! clone the pool handle.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::endpoint::Endpoint;
use crate::error::{BoxError, PoolError, PoolResult};

/// Observable lifecycle state of a pool manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
	Uninitialized,
	Connected,
	Closed,
}

/// Backend-specific half of a pool manager.
///
/// Wraps one external client library: how to open a pool for an endpoint,
/// how to check it, how to release it.
#[async_trait]
pub trait PoolBackend: Send + Sync + 'static {
	type Endpoint: Endpoint;
	/// Shared pool handle. Cloning must be cheap and refer to the same pool.
	type Pool: Clone + Send + Sync + 'static;

	/// Human-readable backend name used in logs and errors
	fn name(&self) -> &'static str;

	async fn open(&self, endpoint: &Self::Endpoint) -> Result<Self::Pool, BoxError>;

	/// Liveness check run right after `open`. `Ok(None)` means the backend has none.
	async fn check_live(&self, _pool: &Self::Pool) -> Result<Option<String>, BoxError> {
		Ok(None)
	}

	async fn release(&self, pool: Self::Pool) -> Result<(), BoxError>;
}

enum Slot<B: PoolBackend> {
	Uninitialized,
	Connected {
		pool: B::Pool,
		endpoint: B::Endpoint,
	},
	Closed,
}

impl<B: PoolBackend> Slot<B> {
	fn state(&self) -> PoolState {
		match self {
			Slot::Uninitialized => PoolState::Uninitialized,
			Slot::Connected { .. } => PoolState::Connected,
			Slot::Closed => PoolState::Closed,
		}
	}
}

/// Create-once / reuse / idempotent-teardown holder for one pool
pub struct PoolLifecycle<B: PoolBackend> {
	backend: B,
	slot: RwLock<Slot<B>>,
}

impl<B: PoolBackend> PoolLifecycle<B> {
	pub fn new(backend: B) -> Self {
		Self {
			backend,
			slot: RwLock::new(Slot::Uninitialized),
		}
	}

	pub fn backend(&self) -> &B {
		&self.backend
	}

	pub async fn state(&self) -> PoolState {
		self.slot.read().await.state()
	}

	pub async fn is_connected(&self) -> bool {
		self.state().await == PoolState::Connected
	}

	/// Endpoint of the live pool, if any
	pub async fn endpoint(&self) -> Option<B::Endpoint> {
		match &*self.slot.read().await {
			Slot::Connected { endpoint, .. } => Some(endpoint.clone()),
			_ => None,
		}
	}

	/// Open the pool unless it is already open.
	///
	/// Reconnecting to the same endpoint is a no-op. Reconnecting to a
	/// different endpoint is rejected with [`PoolError::EndpointConflict`]
	/// and leaves the live pool untouched; call `disconnect` first.
	pub async fn connect(&self, endpoint: B::Endpoint) -> PoolResult<()> {
		let backend = self.backend.name();
		let mut slot = self.slot.write().await;

		if let Slot::Connected { endpoint: current, .. } = &*slot {
			if *current == endpoint {
				tracing::info!(
					backend,
					endpoint = %current.address(),
					"already connected, reusing existing pool"
				);
				return Ok(());
			}
			tracing::error!(
				backend,
				current = %current.address(),
				requested = %endpoint.address(),
				"refusing to reconnect to a different endpoint"
			);
			return Err(PoolError::EndpointConflict {
				backend,
				current: current.address(),
				requested: endpoint.address(),
			});
		}

		let address = endpoint.address();
		let pool = match self.backend.open(&endpoint).await {
			Ok(pool) => pool,
			Err(source) => {
				*slot = Slot::Uninitialized;
				tracing::error!(
					backend,
					endpoint = %address,
					error = %source,
					"failed to create connection pool"
				);
				return Err(PoolError::connection(backend, address, source));
			}
		};

		match self.backend.check_live(&pool).await {
			Ok(reply) => {
				tracing::info!(
					backend,
					endpoint = %address,
					liveness = reply.as_deref().unwrap_or("skipped"),
					"connected"
				);
			}
			Err(source) => {
				tracing::error!(
					backend,
					endpoint = %address,
					error = %source,
					"liveness check failed, discarding new pool"
				);
				if let Err(release_error) = self.backend.release(pool).await {
					tracing::warn!(
						backend,
						error = %release_error,
						"failed to release pool after liveness failure"
					);
				}
				*slot = Slot::Uninitialized;
				return Err(PoolError::connection(backend, address, source));
			}
		}

		*slot = Slot::Connected { pool, endpoint };
		Ok(())
	}

	/// Release the pool if one is open.
	///
	/// The reference is cleared before the backend release runs, so even a
	/// failed release ([`PoolError::Teardown`]) never leaves a half-closed
	/// pool behind.
	pub async fn disconnect(&self) -> PoolResult<()> {
		let backend = self.backend.name();
		let mut slot = self.slot.write().await;

		let (pool, endpoint) = match std::mem::replace(&mut *slot, Slot::Closed) {
			Slot::Connected { pool, endpoint } => (pool, endpoint),
			previous => {
				*slot = previous;
				tracing::warn!(backend, "already disconnected");
				return Ok(());
			}
		};

		match self.backend.release(pool).await {
			Ok(()) => {
				tracing::info!(backend, endpoint = %endpoint.address(), "connection pool closed");
				Ok(())
			}
			Err(source) => {
				tracing::error!(
					backend,
					endpoint = %endpoint.address(),
					error = %source,
					"failed to close connection pool"
				);
				Err(PoolError::Teardown { backend, source })
			}
		}
	}

	/// Clone of the live pool handle, or [`PoolError::NotConnected`].
	pub async fn pool(&self) -> PoolResult<B::Pool> {
		match &*self.slot.read().await {
			Slot::Connected { pool, .. } => Ok(pool.clone()),
			_ => Err(PoolError::NotConnected {
				backend: self.backend.name(),
			}),
		}
	}
}
