//! Ingest run: resolve settings, then drive the pipeline.

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::{IndexName, IngestSettings};
use tracing::info;

use crate::cli::{Destination, RunArgs};
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute one ingest run
pub async fn run_ingest(args: &RunArgs) -> Result<()> {
    if !args.evtxfile.exists() {
        return Err(CliError::source_not_found(&args.evtxfile).into());
    }

    let settings = resolve_settings(args)?;
    let destination = args.destination();

    info!(
        source = %args.evtxfile.display(),
        destination = ?destination,
        index = %settings.index,
        batch_size = settings.batch_size,
        metadata_fields = settings.metadata.as_map().len(),
        "Settings resolved"
    );

    let pipeline = Pipeline::new(PipelineConfig {
        source: args.evtxfile.clone(),
        destination: destination.clone(),
        settings,
        debug: args.debug,
    });

    let stats = pipeline.run().await.context("Ingest failed")?;
    stats.log_summary();

    if let Destination::Export(path) = &destination {
        println!("{} events exported to {}", stats.delivered(), path.display());
    }

    Ok(())
}

/// Defaults, then the settings file, then command-line values
pub fn resolve_settings(args: &RunArgs) -> crate::error::Result<IngestSettings> {
    let mut settings = match &args.config {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::config_not_found(path));
            }
            info!(config = %path.display(), "Loading settings file");
            ConfigLoader::load_from_path(path)?
        }
        None => IngestSettings::default(),
    };

    if let Some(index) = &args.index {
        settings.index = IndexName::from(index.as_str());
    }
    if let Some(batch_size) = args.batch_size {
        settings.batch_size = batch_size;
    }
    if let Some(meta) = &args.meta {
        settings.metadata = meta.clone();
    }
    if let Some(timeout) = args.timeout {
        settings.sink.timeout_secs = timeout;
    }
    if let Some(username) = &args.username {
        settings.sink.username = Some(username.clone());
    }
    if let Some(password) = &args.password {
        settings.sink.password = Some(password.clone());
    }

    config_loader::validate(&settings)?;
    Ok(settings)
}
