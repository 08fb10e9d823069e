//! Recompute every professional's aggregate rating from the rating rows.
//!
//! Run after bulk imports or manual data fixes; the pass is idempotent.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::env;
use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::runtime::Builder;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use marketplace::domain::RatingConsistencyService;
use marketplace::domain::ports::RatingMaintenance;
use marketplace::outbound::persistence::{DbPool, DieselRatingRepository, PoolConfig};

/// `reconcile-ratings` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "reconcile-ratings",
    about = "Recompute every professional's aggregate rating",
    version
)]
struct CliArgs {
    /// Database connection URL. Falls back to `MARKETPLACE_DATABASE_URL`.
    #[arg(long = "database-url", value_name = "url")]
    database_url: Option<String>,
    /// Maximum pooled connections for the pass.
    #[arg(long = "pool-size", value_name = "n", default_value_t = 2)]
    pool_size: u32,
}

fn main() -> io::Result<ExitCode> {
    if let Err(e) = fmt().with_env_filter(EnvFilter::from_default_env()).try_init() {
        eprintln!("tracing init failed: {e}");
    }
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(async_main())
}

async fn async_main() -> io::Result<ExitCode> {
    let args = CliArgs::parse();
    let database_url =
        resolve_database_url(args.database_url, env::var("MARKETPLACE_DATABASE_URL").ok())?;
    let pool = DbPool::new(PoolConfig::new(database_url).with_max_size(args.pool_size))
        .await
        .map_err(|error| io::Error::other(format!("create database pool: {error}")))?;

    let service = RatingConsistencyService::new(Arc::new(DieselRatingRepository::new(pool)));
    let report = service
        .reconcile_all()
        .await
        .map_err(|error| io::Error::other(format!("reconcile ratings: {error}")))?;

    info!(
        recomputed = report.recomputed.len(),
        failed = report.failed.len(),
        "reconciliation finished"
    );
    for professional_id in &report.failed {
        warn!(%professional_id, "aggregate not recomputed");
        println!("failed={professional_id}");
    }
    println!("recomputed={}", report.recomputed.len());

    Ok(if report.is_complete() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn resolve_database_url(explicit: Option<String>, from_env: Option<String>) -> io::Result<String> {
    let present = |url: &String| !url.trim().is_empty();
    explicit
        .filter(present)
        .or_else(|| from_env.filter(present))
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "database URL missing: set --database-url or MARKETPLACE_DATABASE_URL",
            )
        })
}
