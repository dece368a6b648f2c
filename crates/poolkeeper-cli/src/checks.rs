//! Smoke checks against live servers

use std::future::Future;
use std::time::Instant;

use anyhow::{Context, bail, ensure};
use futures::future::try_join_all;
use poolkeeper_cache::{CacheEndpoint, CachePool, with_cache_client};
use poolkeeper_core::PoolError;
use poolkeeper_db::{DatabaseClient, DatabaseEndpoint, Row, sql_args};

const ROUND_TRIP_KEY: &str = "poolkeeper:smoke:connection";
const COUNTER_KEY: &str = "poolkeeper:smoke:counter";
const PING_COUNT: usize = 100;
const CONCURRENT_INCRS: usize = 10;

struct Outcome {
	name: &'static str,
	millis: u128,
	error: Option<anyhow::Error>,
}

/// Pass/fail record of every check that ran
#[derive(Default)]
pub struct Report {
	outcomes: Vec<Outcome>,
}

impl Report {
	async fn run<F, Fut>(&mut self, name: &'static str, check: F)
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = anyhow::Result<()>>,
	{
		let started = Instant::now();
		let result = check().await;
		let millis = started.elapsed().as_millis();

		match &result {
			Ok(()) => tracing::info!(check = name, millis, "passed"),
			Err(e) => tracing::error!(check = name, millis, error = %e, "failed"),
		}
		self.outcomes.push(Outcome {
			name,
			millis,
			error: result.err(),
		});
	}

	pub fn all_passed(&self) -> bool {
		self.outcomes.iter().all(|o| o.error.is_none())
	}

	pub fn print(&self) {
		for outcome in &self.outcomes {
			match &outcome.error {
				None => println!("PASS {:<32} {:>6}ms", outcome.name, outcome.millis),
				Some(e) => println!("FAIL {:<32} {:>6}ms  {:#}", outcome.name, outcome.millis, e),
			}
		}
		let failed = self.outcomes.iter().filter(|o| o.error.is_some()).count();
		println!("{} passed, {} failed", self.outcomes.len() - failed, failed);
	}
}

pub async fn cache(endpoint: &CacheEndpoint, report: &mut Report) {
	let pool = &CachePool::new();

	report
		.run("cache: initialize", || async move {
			pool.initialize(endpoint.clone()).await?;
			pool.initialize(endpoint.clone()).await?;
			Ok(())
		})
		.await;

	report
		.run("cache: set/get/delete", || async move {
			with_cache_client(pool, |client| async move {
				client.set(ROUND_TRIP_KEY, "Hello from poolkeeper!").await?;
				let value = client.get(ROUND_TRIP_KEY).await?;
				ensure!(
					value.as_deref() == Some("Hello from poolkeeper!"),
					"unexpected value {:?}",
					value
				);
				client.delete(&[ROUND_TRIP_KEY]).await?;
				ensure!(client.get(ROUND_TRIP_KEY).await?.is_none(), "key survived delete");
				Ok(())
			})
			.await
		})
		.await;

	report
		.run("cache: repeated ping", || async move {
			pool.with_client(|client| async move {
				for _ in 0..PING_COUNT {
					let reply = client.ping().await?;
					ensure!(reply == "PONG", "unexpected PING reply {:?}", reply);
				}
				Ok(())
			})
			.await
		})
		.await;

	report
		.run("cache: concurrent incr", || async move {
			let client = pool.get_client().await?;
			client.delete(&[COUNTER_KEY]).await?;
			try_join_all((0..CONCURRENT_INCRS).map(|_| client.incr(COUNTER_KEY, 1))).await?;
			let total = client.get(COUNTER_KEY).await?;
			client.delete(&[COUNTER_KEY]).await?;
			ensure!(
				total == Some(CONCURRENT_INCRS.to_string()),
				"counter is {:?}, expected {}",
				total,
				CONCURRENT_INCRS
			);
			Ok(())
		})
		.await;

	report
		.run("cache: usable after failed operation", || async move {
			let failed: Result<(), PoolError> = pool
				.with_client(|client| async move {
					client.set(COUNTER_KEY, "not a number").await?;
					client.incr(COUNTER_KEY, 1).await.map(|_| ())
				})
				.await;
			ensure!(failed.is_err(), "INCR on a non-integer succeeded");
			pool.get_client().await?.delete(&[COUNTER_KEY]).await?;
			let reply = pool.ping().await?;
			ensure!(reply == "PONG", "unexpected PING reply {:?}", reply);
			Ok(())
		})
		.await;

	report
		.run("cache: close", || async move {
			pool.close().await?;
			pool.close().await?;
			if pool.get_client().await.is_ok() {
				bail!("client still available after close");
			}
			Ok(())
		})
		.await;
}

pub async fn db(endpoint: &DatabaseEndpoint, report: &mut Report) {
	let db = &DatabaseClient::new();

	report
		.run("db: connect", || async move {
			db.connect(endpoint.clone()).await?;
			db.connect(endpoint.clone()).await?;
			Ok(())
		})
		.await;

	report
		.run("db: script and queries", || async move {
			db.execute_script(
				"DROP TABLE IF EXISTS poolkeeper_smoke;
				 CREATE TABLE poolkeeper_smoke (id INT PRIMARY KEY, label TEXT NOT NULL);",
			)
			.await?;

			let inserted = db
				.fetch_one(
					"INSERT INTO poolkeeper_smoke (id, label) VALUES ($1, $2) RETURNING id",
					sql_args![1, "one"],
				)
				.await?
				.context("INSERT returned no row")?;
			let id: i32 = inserted.try_get("id")?;
			ensure!(id == 1, "unexpected id {}", id);

			let row = db
				.fetch_one("SELECT label FROM poolkeeper_smoke WHERE id = $1", sql_args![1])
				.await?
				.context("inserted row missing")?;
			let label: String = row.try_get("label")?;
			ensure!(label == "one", "unexpected label {:?}", label);

			let missing = db
				.fetch_one("SELECT label FROM poolkeeper_smoke WHERE id = $1", sql_args![99])
				.await?;
			ensure!(missing.is_none(), "phantom row");

			db.execute_script("DROP TABLE poolkeeper_smoke").await?;
			Ok(())
		})
		.await;

	report
		.run("db: fetch_all", || async move {
			let rows = db
				.fetch_all("SELECT generate_series(1, $1) AS n", sql_args![3])
				.await?;
			ensure!(rows.len() == 3, "expected 3 rows, got {}", rows.len());
			Ok(())
		})
		.await;

	report
		.run("db: disconnect", || async move {
			db.disconnect().await?;
			db.disconnect().await?;
			ensure!(!db.is_connected().await, "still connected after disconnect");
			Ok(())
		})
		.await;
}
