//! Pipeline statistics.

use std::time::Duration;

use observability::IngestMetricsAggregator;
use tracing::info;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Total duration of the run
    pub duration: Duration,

    /// "export" or "index"
    pub mode: &'static str,

    /// Per-record and per-batch counters
    pub metrics: IngestMetricsAggregator,
}

impl PipelineStats {
    pub fn new(mode: &'static str) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Documents written to the export file or accepted by the sink
    pub fn delivered(&self) -> u64 {
        self.metrics.documents_delivered
    }

    /// Records per second
    pub fn throughput(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.metrics.records_read as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Log the run summary
    pub fn log_summary(&self) {
        let summary = self.metrics.summary();
        info!(
            mode = self.mode,
            records_read = summary.records_read,
            normalized = summary.documents_normalized,
            rejected = summary.total_rejected,
            delivered = summary.documents_delivered,
            batches = summary.batches,
            duration_secs = format!("{:.2}", self.duration.as_secs_f64()),
            records_per_sec = format!("{:.1}", self.throughput()),
            "Run completed"
        );
        for (reason, count) in &summary.rejected {
            info!(reason, count, "Rejected records");
        }
        tracing::debug!("\n{summary}");
    }
}
