//! Ingest metrics
//!
//! Counters go through the `metrics` facade (no-ops unless a recorder is
//! installed). The aggregator keeps the same numbers in memory for the run
//! summary.

use std::collections::BTreeMap;

use metrics::{counter, histogram};

pub fn record_record_read() {
    counter!("evtx2es_records_read_total").increment(1);
}

/// Record a dropped record, labelled by failure reason
pub fn record_record_rejected(reason: &'static str) {
    counter!("evtx2es_records_rejected_total", "reason" => reason).increment(1);
}

pub fn record_document_normalized() {
    counter!("evtx2es_documents_normalized_total").increment(1);
}

/// Record one bulk submission
pub fn record_batch_flushed(size: usize, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!("evtx2es_batches_flushed_total", "status" => status).increment(1);
    histogram!("evtx2es_batch_size").record(size as f64);
}

/// In-memory ingest aggregator
#[derive(Debug, Clone, Default)]
pub struct IngestMetricsAggregator {
    /// Items yielded by the source (including unreadable ones)
    pub records_read: u64,

    /// Records turned into documents
    pub documents_normalized: u64,

    /// Dropped records per reason
    pub rejected: BTreeMap<&'static str, u64>,

    /// Documents accepted by the sink
    pub documents_delivered: u64,

    /// Successful batch sizes
    pub batch_sizes: RunningStats,

    /// Failed submissions
    pub failed_batches: u64,
}

impl IngestMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_read(&mut self) {
        self.records_read += 1;
        record_record_read();
    }

    pub fn record_normalized(&mut self) {
        self.documents_normalized += 1;
        record_document_normalized();
    }

    pub fn record_rejected(&mut self, reason: &'static str) {
        *self.rejected.entry(reason).or_insert(0) += 1;
        record_record_rejected(reason);
    }

    /// Documents delivered outside of batches (export mode)
    pub fn record_delivered(&mut self, count: u64) {
        self.documents_delivered += count;
    }

    pub fn record_batch(&mut self, size: usize, success: bool) {
        if success {
            self.batch_sizes.push(size as f64);
            self.documents_delivered += size as u64;
        } else {
            self.failed_batches += 1;
        }
        record_batch_flushed(size, success);
    }

    pub fn total_rejected(&self) -> u64 {
        self.rejected.values().sum()
    }

    pub fn summary(&self) -> IngestSummary {
        IngestSummary {
            records_read: self.records_read,
            documents_normalized: self.documents_normalized,
            total_rejected: self.total_rejected(),
            rejected: self.rejected.clone(),
            documents_delivered: self.documents_delivered,
            batches: self.batch_sizes.count(),
            failed_batches: self.failed_batches,
            batch_size: StatsSummary::from(&self.batch_sizes),
        }
    }
}

/// Aggregated numbers for one run
#[derive(Debug, Clone, Default)]
pub struct IngestSummary {
    pub records_read: u64,
    pub documents_normalized: u64,
    pub total_rejected: u64,
    pub rejected: BTreeMap<&'static str, u64>,
    pub documents_delivered: u64,
    pub batches: u64,
    pub failed_batches: u64,
    pub batch_size: StatsSummary,
}

impl std::fmt::Display for IngestSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Ingest Summary ===")?;
        writeln!(f, "Records read: {}", self.records_read)?;
        writeln!(f, "Documents normalized: {}", self.documents_normalized)?;
        writeln!(f, "Records rejected: {}", self.total_rejected)?;
        for (reason, count) in &self.rejected {
            writeln!(f, "  {reason}: {count}")?;
        }
        writeln!(f, "Documents delivered: {}", self.documents_delivered)?;
        writeln!(
            f,
            "Batches: {} ({} failed)",
            self.batches, self.failed_batches
        )?;
        writeln!(f, "Batch size: {}", self.batch_size)
    }
}

/// Summary of a [`RunningStats`]
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.0}, max={:.0}, mean={:.1}, std={:.1} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
