//! # evtx2es
//!
//! Command-line entry point.
//!
//! Provides:
//! - Settings resolution (file, environment, flags)
//! - Pipeline orchestration: read, normalize, deliver
//! - Run summary and exit status

mod cli;
mod commands;
mod error;
mod pipeline;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::Cli;
use commands::run_ingest;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    observability::init_with_config(ObservabilityConfig {
        log_format: cli.log_format.into(),
        metrics_port: cli.run.metrics_port(),
        default_log_level: cli.default_log_level().to_string(),
    })?;

    info!(version = env!("CARGO_PKG_VERSION"), "evtx2es starting");

    let result = run_ingest(&cli.run).await;

    if let Err(ref e) = result {
        tracing::error!(error = format!("{e:#}"), "Run failed");
    }

    result
}
