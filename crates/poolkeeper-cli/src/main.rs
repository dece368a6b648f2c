//! poolkeeper smoke runner
//!
//! Exercises the cache and database pool managers against live servers and
//! exits non-zero when any check fails.
//!
//! ```bash
//! poolkeeper-smoke cache --host localhost --port 6379
//! poolkeeper-smoke --container all
//! ```

mod checks;

use std::process;

use clap::{Parser, Subcommand};
use poolkeeper_cache::CacheEndpoint;
use poolkeeper_core::Env;
use poolkeeper_db::DatabaseEndpoint;
use poolkeeper_test::RunningContainer;
use tracing_subscriber::EnvFilter;

use crate::checks::Report;

#[derive(Parser)]
#[command(name = "poolkeeper-smoke")]
#[command(about = "Smoke-test the PostgreSQL and Valkey pool managers", long_about = None)]
#[command(version)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	/// Start throwaway containers instead of using configured servers
	#[arg(long, global = true)]
	container: bool,

	/// Verbosity level (can be repeated)
	#[arg(short, long, action = clap::ArgAction::Count, global = true)]
	verbosity: u8,
}

#[derive(Subcommand)]
enum Commands {
	/// Check the Valkey/Redis pool manager
	Cache(CacheArgs),
	/// Check the PostgreSQL pool manager
	Db(DbArgs),
	/// Run every check
	All {
		#[command(flatten)]
		cache: CacheArgs,
		#[command(flatten)]
		db: DbArgs,
	},
}

#[derive(clap::Args, Default)]
struct CacheArgs {
	/// Valkey host (overrides VALKEY_HOST)
	#[arg(id = "valkey_host", long = "valkey-host", value_name = "HOST")]
	host: Option<String>,

	/// Valkey port (overrides VALKEY_PORT)
	#[arg(id = "valkey_port", long = "valkey-port", value_name = "PORT")]
	port: Option<u16>,
}

#[derive(clap::Args, Default)]
struct DbArgs {
	/// PostgreSQL host (overrides POSTGRES_HOST)
	#[arg(id = "postgres_host", long = "postgres-host", value_name = "HOST")]
	host: Option<String>,

	/// PostgreSQL port (overrides POSTGRES_PORT)
	#[arg(id = "postgres_port", long = "postgres-port", value_name = "PORT")]
	port: Option<u16>,
}

fn init_tracing(verbosity: u8) {
	let default_level = match verbosity {
		0 => "warn",
		1 => "info",
		2 => "debug",
		_ => "trace",
	};
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
	tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	init_tracing(cli.verbosity);

	match run(cli).await {
		Ok(report) => {
			report.print();
			if !report.all_passed() {
				process::exit(1);
			}
		}
		Err(e) => {
			eprintln!("Error: {:#}", e);
			process::exit(1);
		}
	}
}

async fn run(cli: Cli) -> anyhow::Result<Report> {
	let env = Env::new();
	let mut report = Report::default();

	let (cache_args, db_args) = match cli.command {
		Commands::Cache(cache) => (Some(cache), None),
		Commands::Db(db) => (None, Some(db)),
		Commands::All { cache, db } => (Some(cache), Some(db)),
	};

	// Containers stop when dropped, so they live until the checks finish.
	let mut containers: Vec<RunningContainer> = Vec::new();

	if let Some(args) = cache_args {
		let endpoint = if cli.container {
			let running = poolkeeper_test::start_valkey()
				.await
				.map_err(|e| anyhow::anyhow!("failed to start Valkey container: {}", e))?;
			let endpoint = poolkeeper_test::valkey_endpoint(&running.1, running.2);
			containers.push(running);
			endpoint
		} else {
			cache_endpoint(&env, args)?
		};
		checks::cache(&endpoint, &mut report).await;
	}

	if let Some(args) = db_args {
		let endpoint = if cli.container {
			let running = poolkeeper_test::start_postgres()
				.await
				.map_err(|e| anyhow::anyhow!("failed to start PostgreSQL container: {}", e))?;
			let endpoint = poolkeeper_test::postgres_endpoint(&running.1, running.2);
			containers.push(running);
			endpoint
		} else {
			db_endpoint(&env, args)?
		};
		checks::db(&endpoint, &mut report).await;
	}

	Ok(report)
}

fn cache_endpoint(env: &Env, args: CacheArgs) -> anyhow::Result<CacheEndpoint> {
	let mut endpoint = CacheEndpoint::from_env(env)?;
	if let Some(host) = args.host {
		endpoint.host = host;
	}
	if let Some(port) = args.port {
		endpoint.port = port;
	}
	Ok(endpoint)
}

fn db_endpoint(env: &Env, args: DbArgs) -> anyhow::Result<DatabaseEndpoint> {
	let mut endpoint = DatabaseEndpoint::from_env(env)?;
	if let Some(host) = args.host {
		endpoint.host = host;
	}
	if let Some(port) = args.port {
		endpoint.port = port;
	}
	Ok(endpoint)
}
