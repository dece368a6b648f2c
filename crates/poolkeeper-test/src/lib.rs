//! # poolkeeper-test
//!
//! Ephemeral PostgreSQL and Valkey containers for integration tests.
//!
//! The fixtures hand back the running container together with the host and
//! the dynamically mapped port. Keep the container value alive for as long
//! as the test needs the server; dropping it stops the container.

pub mod containers;

pub use containers::{
	POSTGRES_DB, POSTGRES_PASSWORD, POSTGRES_USER, RunningContainer, StartError,
	postgres_container, postgres_endpoint, start_postgres, start_valkey, valkey_container,
	valkey_endpoint,
};
pub use testcontainers::{ContainerAsync, GenericImage};
