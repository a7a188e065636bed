//! CLI entry point: wires configuration, runs the Segmenter phase then the
//! Rasterizer phase against the configured store (spec.md §6 "Driver").

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use trajcell::config::Config;
use trajcell::scheduler::Scheduler;
#[cfg(feature = "postgres")]
use trajcell::store::postgres_store::PostgresStore;
use trajcell::Thresholds;

/// Structured logging, following the `butterfly-route` query-server
/// convention: `RUST_LOG` filtering, info-level default.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(false).init();
}

fn main() -> ExitCode {
    init_tracing();
    let config = Config::parse();

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if e.downcast_ref::<trajcell::Error>().map(|e| matches!(e, trajcell::Error::MissingConnectionString)).unwrap_or(false) {
                tracing::error!("{e:#}");
                ExitCode::from(1)
            } else {
                tracing::error!("{e:#}");
                ExitCode::from(2)
            }
        }
    }
}

#[cfg(feature = "postgres")]
fn run(config: &Config) -> Result<()> {
    let database_url = config.require_database_url()?;
    let store = PostgresStore::connect(database_url).context("connecting to database")?;
    store.ensure_schema().context("ensuring schema")?;

    let scheduler = Scheduler::new(config)?;
    let thresholds = Thresholds::default();

    let stats = scheduler.run_segmenter_phase(&store, &thresholds)?;
    tracing::info!(
        trajectories = stats.trajectories_emitted,
        stops = stats.stops_emitted,
        points_seen = stats.points_seen,
        duplicates_dropped = stats.duplicates_dropped,
        outliers_dropped = stats.outliers_dropped,
        "segmenter phase complete"
    );

    let trajectories = store.trajectories_pending_rasterization().context("loading trajectories")?;
    let stops = store.stops_pending_rasterization().context("loading stops")?;
    scheduler.run_rasterizer_phase(&store, &trajectories, &stops)?;
    tracing::info!("rasterizer phase complete");

    Ok(())
}

#[cfg(not(feature = "postgres"))]
fn run(config: &Config) -> Result<()> {
    let _ = config.require_database_url()?;
    anyhow::bail!("trajcell was built without the `postgres` feature; no store adapter is available")
}
