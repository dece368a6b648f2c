//! PostgreSQL and Valkey container fixtures

use std::time::Duration;

use poolkeeper_cache::CacheEndpoint;
use poolkeeper_db::DatabaseEndpoint;
use rstest::fixture;
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};

pub const POSTGRES_DB: &str = "postgres";
pub const POSTGRES_USER: &str = "postgres";
pub const POSTGRES_PASSWORD: &str = "postgres";

const POSTGRES_PORT: u16 = 5432;
const VALKEY_PORT: u16 = 6379;
const MAX_START_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(2);

pub type StartError = Box<dyn std::error::Error + Send + Sync>;

/// Container plus the host and mapped port it is reachable on
pub type RunningContainer = (ContainerAsync<GenericImage>, String, u16);

/// Start `postgres:16-alpine` with [`POSTGRES_USER`] / [`POSTGRES_PASSWORD`].
pub async fn start_postgres() -> Result<RunningContainer, StartError> {
	let container = GenericImage::new("postgres", "16-alpine")
		.with_exposed_port(POSTGRES_PORT.tcp())
		.with_wait_for(WaitFor::message_on_stderr(
			"database system is ready to accept connections",
		))
		.with_startup_timeout(Duration::from_secs(120))
		.with_env_var("POSTGRES_DB", POSTGRES_DB)
		.with_env_var("POSTGRES_USER", POSTGRES_USER)
		.with_env_var("POSTGRES_PASSWORD", POSTGRES_PASSWORD)
		.start()
		.await?;

	// The init server logs the same readiness line before restarting.
	tokio::time::sleep(Duration::from_millis(500)).await;

	let host = container.get_host().await?.to_string();
	let port = container.get_host_port_ipv4(POSTGRES_PORT).await?;
	tracing::debug!(image = "postgres:16-alpine", %host, port, "container started");

	Ok((container, host, port))
}

/// Start `valkey/valkey:8-alpine`.
pub async fn start_valkey() -> Result<RunningContainer, StartError> {
	let container = GenericImage::new("valkey/valkey", "8-alpine")
		.with_exposed_port(VALKEY_PORT.tcp())
		.with_wait_for(WaitFor::message_on_stdout("Ready to accept connections"))
		.start()
		.await?;

	let host = container.get_host().await?.to_string();
	let port = container.get_host_port_ipv4(VALKEY_PORT).await?;
	tracing::debug!(image = "valkey/valkey:8-alpine", %host, port, "container started");

	Ok((container, host, port))
}

async fn start_with_retries<F, Fut>(image: &str, start: F) -> RunningContainer
where
	F: Fn() -> Fut,
	Fut: std::future::Future<Output = Result<RunningContainer, StartError>>,
{
	let mut last_error = None;

	for attempt in 1..=MAX_START_ATTEMPTS {
		match start().await {
			Ok(running) => return running,
			Err(e) => {
				eprintln!(
					"{} container start attempt {} of {} failed: {:?}",
					image, attempt, MAX_START_ATTEMPTS, e
				);
				last_error = Some(e);
				if attempt < MAX_START_ATTEMPTS {
					tokio::time::sleep(RETRY_DELAY).await;
				}
			}
		}
	}

	panic!(
		"Failed to start {} container after {} attempts: {:?}",
		image, MAX_START_ATTEMPTS, last_error
	);
}

/// Fixture providing a PostgreSQL container.
///
/// # Examples
///
/// ```ignore
/// use poolkeeper_test::{RunningContainer, postgres_container, postgres_endpoint};
/// use rstest::*;
///
/// #[rstest]
/// #[tokio::test]
/// async fn test_with_postgres(#[future] postgres_container: RunningContainer) {
///     let (_container, host, port) = postgres_container.await;
///     let endpoint = postgres_endpoint(&host, port);
/// }
/// ```
#[fixture]
pub async fn postgres_container() -> RunningContainer {
	start_with_retries("PostgreSQL", start_postgres).await
}

/// Fixture providing a Valkey container.
#[fixture]
pub async fn valkey_container() -> RunningContainer {
	start_with_retries("Valkey", start_valkey).await
}

/// Endpoint for a container started by [`start_postgres`]
pub fn postgres_endpoint(host: &str, port: u16) -> DatabaseEndpoint {
	DatabaseEndpoint::new(host, port, POSTGRES_DB, POSTGRES_USER, POSTGRES_PASSWORD)
}

pub fn valkey_endpoint(host: &str, port: u16) -> CacheEndpoint {
	CacheEndpoint::new(host, port)
}
