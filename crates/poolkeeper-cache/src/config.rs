//! Cache endpoint configuration

use std::fmt;
use std::time::Duration;

use poolkeeper_core::{Endpoint, Env, PoolResult, host_port};
use serde::{Deserialize, Serialize};

fn default_host() -> String {
	"localhost".to_string()
}

fn default_port() -> u16 {
	6379
}

fn default_request_timeout_ms() -> u64 {
	5000
}

/// Valkey/Redis connection target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEndpoint {
	#[serde(default = "default_host")]
	pub host: String,

	#[serde(default = "default_port")]
	pub port: u16,

	/// Upper bound on connecting and on every single command
	#[serde(default = "default_request_timeout_ms")]
	pub request_timeout_ms: u64,
}

impl CacheEndpoint {
	pub fn new(host: impl Into<String>, port: u16) -> Self {
		Self {
			host: host.into(),
			port,
			request_timeout_ms: default_request_timeout_ms(),
		}
	}

	pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
		self
	}

	/// Build from `VALKEY_HOST`, `VALKEY_PORT` and `VALKEY_REQUEST_TIMEOUT_MS`.
	pub fn from_env(env: &Env) -> PoolResult<Self> {
		Ok(Self {
			host: env.str_with_default("VALKEY_HOST", "localhost"),
			port: env.parse_with_default("VALKEY_PORT", default_port())?,
			request_timeout_ms: env
				.parse_with_default("VALKEY_REQUEST_TIMEOUT_MS", default_request_timeout_ms())?,
		})
	}

	pub fn request_timeout(&self) -> Duration {
		Duration::from_millis(self.request_timeout_ms)
	}

	/// `host:port`, with IPv6 literals bracketed
	pub fn address(&self) -> String {
		host_port(&self.host, self.port)
	}

	/// `redis://host:port/`
	pub fn to_url(&self) -> String {
		format!("redis://{}/", self.address())
	}
}

impl Default for CacheEndpoint {
	fn default() -> Self {
		Self::new(default_host(), default_port())
	}
}

impl Endpoint for CacheEndpoint {
	fn address(&self) -> String {
		CacheEndpoint::address(self)
	}
}

impl fmt::Display for CacheEndpoint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.address())
	}
}
