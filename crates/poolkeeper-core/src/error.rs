//! Pool manager error types

/// Boxed backend error kept as the `source` of a [`PoolError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for pool manager operations
pub type PoolResult<T> = std::result::Result<T, PoolError>;

/// Errors surfaced by the pool managers.
///
/// Messages name the backend and, where relevant, the `host:port` endpoint.
/// They never carry credentials.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
	/// The underlying pool or client could not be created.
	#[error("Cannot connect to {backend} server at {endpoint}")]
	Connection {
		backend: &'static str,
		endpoint: String,
		#[source]
		source: BoxError,
	},

	/// An operation was attempted before `connect()` succeeded or after `disconnect()`.
	#[error("{backend} is not connected. Call connect() first.")]
	NotConnected { backend: &'static str },

	/// Releasing the pool failed. The manager has already dropped its reference.
	#[error("Failed to close {backend} connection pool")]
	Teardown {
		backend: &'static str,
		#[source]
		source: BoxError,
	},

	/// The liveness check of an established pool failed.
	#[error("{backend} health check failed at {endpoint}")]
	HealthCheck {
		backend: &'static str,
		endpoint: String,
		#[source]
		source: BoxError,
	},

	/// A query or command sent through the pool failed.
	#[error("{backend} {operation} failed")]
	Query {
		backend: &'static str,
		operation: &'static str,
		#[source]
		source: BoxError,
	},

	/// `connect()` was called with a different endpoint while already connected.
	#[error("{backend} is already connected to {current}; refusing to reconnect to {requested}")]
	EndpointConflict {
		backend: &'static str,
		current: String,
		requested: String,
	},

	/// Invalid configuration value
	#[error("Invalid configuration: {0}")]
	Config(String),
}

impl PoolError {
	pub fn connection(
		backend: &'static str,
		endpoint: impl Into<String>,
		source: impl Into<BoxError>,
	) -> Self {
		Self::Connection {
			backend,
			endpoint: endpoint.into(),
			source: source.into(),
		}
	}

	pub fn query(
		backend: &'static str,
		operation: &'static str,
		source: impl Into<BoxError>,
	) -> Self {
		Self::Query {
			backend,
			operation,
			source: source.into(),
		}
	}

	pub fn is_connection(&self) -> bool {
		matches!(self, Self::Connection { .. })
	}

	pub fn is_not_connected(&self) -> bool {
		matches!(self, Self::NotConnected { .. })
	}

	pub fn is_teardown(&self) -> bool {
		matches!(self, Self::Teardown { .. })
	}

	pub fn is_health_check(&self) -> bool {
		matches!(self, Self::HealthCheck { .. })
	}
}
