//! Integration tests for the PostgreSQL pool manager
//!
//! These tests run against a throwaway `postgres:16-alpine` container per
//! test and cover the connect/disconnect lifecycle, the query helpers, and
//! release of checked-out connections.

use std::time::Duration;

use poolkeeper_core::{PoolError, PoolState};
use poolkeeper_db::{DatabaseClient, DatabaseEndpoint, DatabasePoolOptions, Row, sql_args};
use poolkeeper_integration_tests::{connected_database, init_test_tracing};
use poolkeeper_test::{RunningContainer, postgres_container, postgres_endpoint};
use rstest::*;

#[fixture]
async fn postgres(
	#[future] postgres_container: RunningContainer,
) -> (RunningContainer, DatabaseEndpoint) {
	init_test_tracing();
	let running = postgres_container.await;
	let endpoint = postgres_endpoint(&running.1, running.2);
	(running, endpoint)
}

#[rstest]
#[tokio::test]
async fn test_script_then_fetch(#[future] postgres: (RunningContainer, DatabaseEndpoint)) {
	// Arrange
	let (_container, endpoint) = postgres.await;
	let db = connected_database(endpoint).await;

	// Act
	db.execute_script(
		"CREATE TABLE users (id INT PRIMARY KEY, name TEXT NOT NULL, active BOOLEAN NOT NULL);
		 INSERT INTO users VALUES (1, 'alice', true), (2, 'bob', false), (3, 'carol', true);",
	)
	.await
	.unwrap();
	let one = db
		.fetch_one("SELECT name FROM users WHERE id = $1", sql_args![2])
		.await
		.unwrap();
	let active = db
		.fetch_all(
			"SELECT name FROM users WHERE active = $1 ORDER BY id",
			sql_args![true],
		)
		.await
		.unwrap();

	// Assert
	let name: String = one.unwrap().get("name");
	assert_eq!(name, "bob");
	let names: Vec<String> = active.iter().map(|row| row.get("name")).collect();
	assert_eq!(names, vec!["alice", "carol"]);
}

#[rstest]
#[tokio::test]
async fn test_fetch_one_without_match_is_none(
	#[future] postgres: (RunningContainer, DatabaseEndpoint),
) {
	// Arrange
	let (_container, endpoint) = postgres.await;
	let db = connected_database(endpoint).await;

	// Act
	let row = db
		.fetch_one("SELECT 1 AS n WHERE $1::TEXT IS NULL", sql_args![None::<String>])
		.await
		.unwrap();
	let missing = db
		.fetch_one("SELECT 1 AS n WHERE $1::TEXT IS NULL", sql_args!["present"])
		.await
		.unwrap();

	// Assert
	assert!(row.is_some());
	assert!(missing.is_none());
}

#[rstest]
#[tokio::test]
async fn test_typed_null_fills_non_text_columns(
	#[future] postgres: (RunningContainer, DatabaseEndpoint),
) {
	// Arrange
	let (_container, endpoint) = postgres.await;
	let db = connected_database(endpoint).await;
	db.execute_script("CREATE TABLE scores (id INT PRIMARY KEY, points BIGINT, ok BOOLEAN)")
		.await
		.unwrap();

	// Act
	let inserted = db
		.fetch_one(
			"INSERT INTO scores (id, points, ok) VALUES ($1, $2, $3) RETURNING id",
			sql_args![1, None::<i64>, None::<bool>],
		)
		.await;
	let nulls = db
		.fetch_one(
			"SELECT count(*) AS n FROM scores WHERE points IS NULL AND ok IS NULL",
			sql_args![],
		)
		.await
		.unwrap()
		.unwrap();

	// Assert
	assert!(inserted.unwrap().is_some());
	let n: i64 = nulls.get("n");
	assert_eq!(n, 1);
}

#[rstest]
#[tokio::test]
async fn test_json_and_bytes_arguments(#[future] postgres: (RunningContainer, DatabaseEndpoint)) {
	// Arrange
	let (_container, endpoint) = postgres.await;
	let db = connected_database(endpoint).await;
	let doc = serde_json::json!({"kind": "order", "lines": 2});

	// Act
	let row = db
		.fetch_one(
			"SELECT $1::JSONB ->> 'kind' AS kind, length($2::BYTEA) AS len",
			sql_args![doc, vec![1_u8, 2, 3]],
		)
		.await
		.unwrap()
		.unwrap();

	// Assert
	let kind: String = row.get("kind");
	let len: i32 = row.get("len");
	assert_eq!(kind, "order");
	assert_eq!(len, 3);
}

#[rstest]
#[tokio::test]
async fn test_failed_query_returns_connection_to_pool(
	#[future] postgres: (RunningContainer, DatabaseEndpoint),
) {
	// Arrange
	let (_container, endpoint) = postgres.await;
	let options = DatabasePoolOptions::new()
		.with_max_connections(2)
		.with_acquire_timeout(Duration::from_secs(5));
	let db = DatabaseClient::with_options(options).unwrap();
	db.connect(endpoint).await.unwrap();

	// Act
	let mut failures = Vec::new();
	for _ in 0..5 {
		failures.push(db.execute_script("SELECT * FROM no_such_table").await);
	}
	let after = db.fetch_one("SELECT 1 AS n", sql_args![]).await;

	// Assert
	for failure in failures {
		assert!(matches!(
			failure,
			Err(PoolError::Query { operation: "execute_script", .. })
		));
	}
	assert!(after.unwrap().is_some());
}

#[rstest]
#[tokio::test]
async fn test_dropped_connection_is_released(
	#[future] postgres: (RunningContainer, DatabaseEndpoint),
) {
	// Arrange
	let (_container, endpoint) = postgres.await;
	let options = DatabasePoolOptions::new()
		.with_max_connections(2)
		.with_acquire_timeout(Duration::from_secs(5));
	let db = DatabaseClient::with_options(options).unwrap();
	db.connect(endpoint).await.unwrap();

	// Act
	let first = db.acquire().await.unwrap();
	let second = db.acquire().await.unwrap();
	drop(first);
	let third = tokio::time::timeout(Duration::from_secs(3), db.acquire()).await;

	// Assert
	assert!(third.expect("released connection was not reused").is_ok());
	drop(second);
}

#[rstest]
#[tokio::test]
async fn test_cancelled_operation_releases_connection(
	#[future] postgres: (RunningContainer, DatabaseEndpoint),
) {
	// Arrange
	let (_container, endpoint) = postgres.await;
	let options = DatabasePoolOptions::new()
		.with_max_connections(2)
		.with_acquire_timeout(Duration::from_secs(10));
	let db = DatabaseClient::with_options(options).unwrap();
	db.connect(endpoint).await.unwrap();

	// Act
	for _ in 0..3 {
		let slow = db.execute_script("SELECT pg_sleep(1)");
		let cancelled = tokio::time::timeout(Duration::from_millis(200), slow).await;
		assert!(cancelled.is_err());
	}
	let after = db.fetch_one("SELECT 1 AS n", sql_args![]).await;

	// Assert
	assert!(after.unwrap().is_some());
}

#[rstest]
#[tokio::test]
async fn test_lifecycle_connect_disconnect_reconnect(
	#[future] postgres: (RunningContainer, DatabaseEndpoint),
) {
	// Arrange
	let (_container, endpoint) = postgres.await;
	let db = DatabaseClient::new();

	// Act
	db.connect(endpoint.clone()).await.unwrap();
	let first_pool = db.pool().await.unwrap();
	db.connect(endpoint.clone()).await.unwrap();
	let same_pool = db.pool().await.unwrap();
	db.disconnect().await.unwrap();
	let closed_state = db.state().await;
	db.disconnect().await.unwrap();
	db.connect(endpoint).await.unwrap();

	// Assert
	assert!(first_pool.is_closed());
	assert!(same_pool.is_closed());
	assert_eq!(closed_state, PoolState::Closed);
	assert!(db.is_connected().await);
	assert!(db.fetch_one("SELECT 1 AS n", sql_args![]).await.unwrap().is_some());
}

#[rstest]
#[tokio::test]
async fn test_wrong_password_names_endpoint_only(
	#[future] postgres: (RunningContainer, DatabaseEndpoint),
) {
	// Arrange
	let (_container, endpoint) = postgres.await;
	let wrong = DatabaseEndpoint {
		password: "definitely-wrong".to_string(),
		..endpoint.clone()
	};
	let db = DatabaseClient::new();

	// Act
	let err = db.connect(wrong).await.unwrap_err();

	// Assert
	assert!(err.is_connection());
	assert!(err.to_string().contains(&endpoint.address()));
	assert!(!format!("{:?}", err).contains("definitely-wrong"));
	assert_eq!(db.state().await, PoolState::Uninitialized);
}
