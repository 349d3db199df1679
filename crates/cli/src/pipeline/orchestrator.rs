//! Pipeline orchestrator - read, normalize, deliver.
//!
//! Records are processed strictly in container order on the current task.
//! In export mode documents go straight to the export file; in index mode
//! they go through the bulk queue.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use contracts::{
    BulkSink, ContractError, DocumentSink, IngestSettings, NormalizedDocument, RawRecord,
    RecordSource,
};
use dispatcher::{BulkQueue, DispatcherError, ElasticsearchConfig, ElasticsearchSink, FileSink, PrintSink};
use ingestion::EvtxSource;
use observability::IngestMetricsAggregator;
use tracing::{info, warn};

use super::PipelineStats;
use crate::cli::Destination;

/// Reason label for records the container reader could not produce
const UNREADABLE: &str = "unreadable";

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// EVTX file
    pub source: PathBuf,

    /// Export file or Elasticsearch address
    pub destination: Destination,

    /// Resolved settings
    pub settings: IngestSettings,

    /// Print every document to stdout
    pub debug: bool,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline to completion
    ///
    /// # Errors
    /// Unreadable container, unusable destination or a failed bulk submission.
    pub async fn run(self) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let PipelineConfig {
            source: source_path,
            destination,
            settings,
            debug,
        } = self.config;

        let mut source = EvtxSource::open(&source_path)
            .with_context(|| format!("Failed to open {}", source_path.display()))?;
        let mut printer = debug.then(|| PrintSink::stdout("debug"));

        let mut stats = match destination {
            Destination::Export(path) => {
                info!(path = %path.display(), "Exporting to JSON-lines file");
                let sink = FileSink::open("export", &path)
                    .with_context(|| format!("Failed to open {}", path.display()))?;
                export(&mut source, sink, printer.as_mut()).await?
            }
            Destination::Index(address) => {
                let config = ElasticsearchConfig::from_settings(&address, &settings.sink)?;
                info!(endpoint = %config.endpoint, index = %settings.index, "Indexing into Elasticsearch");
                let sink = ElasticsearchSink::new("elasticsearch", config)?;
                let queue = BulkQueue::new(sink, settings.batch_size)?;
                index(&mut source, queue, &settings, printer.as_mut()).await?
            }
        };

        if let Some(printer) = printer.as_mut() {
            printer.close().await?;
        }

        stats.duration = start_time.elapsed();
        Ok(stats)
    }
}

/// Write every normalized document to `sink`
pub async fn export<R, D>(
    source: &mut R,
    mut sink: D,
    mut printer: Option<&mut PrintSink>,
) -> Result<PipelineStats>
where
    R: RecordSource,
    D: DocumentSink,
{
    let mut stats = PipelineStats::new("export");

    for item in source.records() {
        let Some(document) = next_document(item, &mut stats.metrics) else {
            continue;
        };
        if let Some(printer) = printer.as_deref_mut() {
            printer.write(&document).await?;
        }
        sink.write(&document)
            .await
            .with_context(|| format!("Failed to export to '{}'", sink.name()))?;
        stats.metrics.record_delivered(1);
    }

    sink.close().await?;
    Ok(stats)
}

/// Queue every normalized document for bulk submission
///
/// A failed submission stops the run before any further record is read.
pub async fn index<R, S>(
    source: &mut R,
    mut queue: BulkQueue<S>,
    settings: &IngestSettings,
    mut printer: Option<&mut PrintSink>,
) -> Result<PipelineStats>
where
    R: RecordSource,
    S: BulkSink,
{
    let mut stats = PipelineStats::new("index");

    for item in source.records() {
        let Some(document) = next_document(item, &mut stats.metrics) else {
            continue;
        };
        if let Some(printer) = printer.as_deref_mut() {
            printer.write(&document).await?;
        }
        match queue
            .enqueue(document, &settings.index, &settings.metadata)
            .await
        {
            Ok(Some(size)) => stats.metrics.record_batch(size, true),
            Ok(None) => {}
            Err(e) => return Err(bulk_failure(&mut stats.metrics, e)),
        }
    }

    let report = match queue.drain().await {
        Ok(report) => report,
        Err(e) => return Err(bulk_failure(&mut stats.metrics, e)),
    };
    if let Some(size) = report.final_batch {
        stats.metrics.record_batch(size, true);
    }

    Ok(stats)
}

/// Count a failed submission and turn it into the run's error
fn bulk_failure(metrics: &mut IngestMetricsAggregator, e: DispatcherError) -> anyhow::Error {
    if let DispatcherError::BulkRejected { batch_size, .. } = &e {
        metrics.record_batch(*batch_size, false);
    }
    anyhow::Error::new(e).context("Bulk indexing aborted")
}

/// Normalize one source item, logging and counting whatever is dropped
fn next_document(
    item: Result<RawRecord, ContractError>,
    metrics: &mut IngestMetricsAggregator,
) -> Option<NormalizedDocument> {
    metrics.record_read();

    let record = match item {
        Ok(record) => record,
        Err(e) => {
            warn!(error = %e, "Skipping unreadable record");
            metrics.record_rejected(UNREADABLE);
            return None;
        }
    };

    match normalizer::normalize(&record) {
        Ok(document) => {
            metrics.record_normalized();
            Some(document)
        }
        Err(e) => {
            let partial = serde_json::to_string(&record.tree)
                .unwrap_or_else(|_| "<unprintable>".to_string());
            warn!(
                record_id = record.record_id,
                reason = e.reason(),
                error = %e,
                document = %partial,
                "Dropping record"
            );
            metrics.record_rejected(e.reason());
            None
        }
    }
}
