//! Shared helpers for the poolkeeper integration tests

use poolkeeper_cache::{CacheEndpoint, CachePool};
use poolkeeper_db::{DatabaseClient, DatabaseEndpoint};

/// Route `tracing` output through the test harness. Safe to call repeatedly.
pub fn init_test_tracing() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::new(
			"poolkeeper_core=debug,poolkeeper_db=debug,poolkeeper_cache=debug,info",
		))
		.with_test_writer()
		.try_init();
}

/// A fresh pool already initialized against `endpoint`
pub async fn initialized_cache(endpoint: CacheEndpoint) -> CachePool {
	let pool = CachePool::new();
	pool.initialize(endpoint)
		.await
		.expect("Failed to initialize cache pool");
	pool
}

/// A fresh client already connected to `endpoint`
pub async fn connected_database(endpoint: DatabaseEndpoint) -> DatabaseClient {
	let db = DatabaseClient::new();
	db.connect(endpoint)
		.await
		.expect("Failed to connect database client");
	db
}
