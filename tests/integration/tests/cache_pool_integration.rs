//! Integration tests for the Valkey pool manager
//!
//! Each test starts its own Valkey container, so tests never share keys.
//! Tests touching `CachePool::global()` are serialized.

use futures::future::join_all;
use poolkeeper_cache::{CacheEndpoint, CachePool, with_cache_client};
use poolkeeper_core::{PoolError, PoolState};
use poolkeeper_integration_tests::{init_test_tracing, initialized_cache};
use poolkeeper_test::{RunningContainer, valkey_container, valkey_endpoint};
use rstest::*;
use serial_test::serial;

/// Valkey container plus the endpoint that reaches it
#[fixture]
async fn valkey(#[future] valkey_container: RunningContainer) -> (RunningContainer, CacheEndpoint) {
	init_test_tracing();
	let running = valkey_container.await;
	let endpoint = valkey_endpoint(&running.1, running.2);
	(running, endpoint)
}

#[rstest]
#[tokio::test]
async fn test_set_get_delete_round_trip(#[future] valkey: (RunningContainer, CacheEndpoint)) {
	// Arrange
	let (_container, endpoint) = valkey.await;
	let pool = initialized_cache(endpoint).await;

	// Act
	let (stored, after_delete, deleted) = pool
		.with_client(|client| async move {
			client.set("test:connection", "Hello from Python!").await?;
			let stored = client.get("test:connection").await?;
			let deleted = client.delete(&["test:connection"]).await?;
			let after_delete = client.get("test:connection").await?;
			Ok::<_, PoolError>((stored, after_delete, deleted))
		})
		.await
		.unwrap();

	// Assert
	assert_eq!(stored.as_deref(), Some("Hello from Python!"));
	assert_eq!(deleted, 1);
	assert_eq!(after_delete, None);
}

#[rstest]
#[tokio::test]
async fn test_hundred_pings_through_one_scope(#[future] valkey: (RunningContainer, CacheEndpoint)) {
	// Arrange
	let (_container, endpoint) = valkey.await;
	let pool = initialized_cache(endpoint.clone()).await;

	// Act
	let replies = with_cache_client(&pool, |client| async move {
		let mut replies = Vec::with_capacity(100);
		for _ in 0..100 {
			replies.push(client.ping().await?);
		}
		Ok::<_, PoolError>(replies)
	})
	.await
	.unwrap();

	// Assert
	assert_eq!(replies.len(), 100);
	assert!(replies.iter().all(|reply| reply == "PONG"));
	assert_eq!(pool.state().await, PoolState::Connected);
	assert_eq!(pool.endpoint().await, Some(endpoint));
}

#[rstest]
#[tokio::test]
async fn test_concurrent_increments_are_atomic(#[future] valkey: (RunningContainer, CacheEndpoint)) {
	// Arrange
	let (_container, endpoint) = valkey.await;
	let pool = initialized_cache(endpoint).await;
	pool.get_client().await.unwrap().set("test:counter", "0").await.unwrap();

	// Act
	let tasks = (0..10).map(|_| {
		let pool = pool.clone();
		tokio::spawn(async move { pool.get_client().await?.incr("test:counter", 1).await })
	});
	let results = join_all(tasks).await;

	// Assert
	for result in results {
		result.unwrap().unwrap();
	}
	let value = pool.get_client().await.unwrap().get("test:counter").await.unwrap();
	assert_eq!(value.as_deref(), Some("10"));
}

#[rstest]
#[tokio::test]
async fn test_failed_operation_keeps_pool_usable(#[future] valkey: (RunningContainer, CacheEndpoint)) {
	// Arrange
	let (_container, endpoint) = valkey.await;
	let pool = initialized_cache(endpoint).await;

	// Act
	let failed = pool
		.with_client(|client| async move {
			client.set("test:text", "not a number").await?;
			client.incr("test:text", 1).await
		})
		.await;
	let reply = pool.ping().await;

	// Assert
	let err = failed.unwrap_err();
	assert!(matches!(err, PoolError::Query { operation: "incr", .. }));
	assert_eq!(reply.unwrap(), "PONG");
}

#[rstest]
#[tokio::test]
async fn test_operation_error_type_is_preserved(#[future] valkey: (RunningContainer, CacheEndpoint)) {
	// Arrange
	let (_container, endpoint) = valkey.await;
	let pool = initialized_cache(endpoint).await;

	// Act
	let result: anyhow::Result<()> = with_cache_client(&pool, |client| async move {
		client.set("test:flag", "on").await?;
		anyhow::bail!("application rejected flag")
	})
	.await;

	// Assert
	assert_eq!(result.unwrap_err().to_string(), "application rejected flag");
	let flag = pool.get_client().await.unwrap().get("test:flag").await.unwrap();
	assert_eq!(flag.as_deref(), Some("on"));
}

#[rstest]
#[tokio::test]
async fn test_initialize_twice_keeps_first_client(#[future] valkey: (RunningContainer, CacheEndpoint)) {
	// Arrange
	let (_container, endpoint) = valkey.await;
	let pool = initialized_cache(endpoint.clone()).await;
	let before = pool.get_client().await.unwrap();
	before.set("test:marker", "kept").await.unwrap();

	// Act
	pool.initialize(endpoint).await.unwrap();

	// Assert
	let after = pool.get_client().await.unwrap();
	assert_eq!(after.get("test:marker").await.unwrap().as_deref(), Some("kept"));
	assert_eq!(pool.state().await, PoolState::Connected);
}

#[rstest]
#[tokio::test]
async fn test_initialize_with_other_endpoint_is_rejected(
	#[future] valkey: (RunningContainer, CacheEndpoint),
) {
	// Arrange
	let (_container, endpoint) = valkey.await;
	let pool = initialized_cache(endpoint.clone()).await;
	let other = CacheEndpoint::new(endpoint.host.clone(), endpoint.port.wrapping_add(1));

	// Act
	let err = pool.initialize(other).await.unwrap_err();

	// Assert
	assert!(matches!(err, PoolError::EndpointConflict { .. }));
	assert_eq!(pool.endpoint().await, Some(endpoint));
	assert_eq!(pool.ping().await.unwrap(), "PONG");
}

#[rstest]
#[tokio::test]
async fn test_close_then_reinitialize(#[future] valkey: (RunningContainer, CacheEndpoint)) {
	// Arrange
	let (_container, endpoint) = valkey.await;
	let pool = initialized_cache(endpoint.clone()).await;

	// Act
	pool.close().await.unwrap();
	let while_closed = pool.get_client().await;
	pool.close().await.unwrap();
	pool.initialize(endpoint).await.unwrap();

	// Assert
	assert!(while_closed.unwrap_err().is_not_connected());
	assert_eq!(pool.ping().await.unwrap(), "PONG");
}

#[rstest]
#[tokio::test]
#[serial(cache_global)]
async fn test_global_pool_is_shared(#[future] valkey: (RunningContainer, CacheEndpoint)) {
	// Arrange
	let (_container, endpoint) = valkey.await;
	CachePool::global().initialize(endpoint).await.unwrap();

	// Act
	let handle = CachePool::global().clone();
	handle.get_client().await.unwrap().set("test:global", "shared").await.unwrap();
	let seen = CachePool::global()
		.get_client()
		.await
		.unwrap()
		.get("test:global")
		.await
		.unwrap();

	// Assert
	assert_eq!(seen.as_deref(), Some("shared"));
	CachePool::global().close().await.unwrap();
	assert_eq!(handle.state().await, PoolState::Closed);
}
