//! BulkQueue - threshold batching in front of a bulk sink

use std::sync::Arc;

use contracts::{BulkSink, DispatchEnvelope, IndexName, Metadata, NormalizedDocument};
use tracing::{debug, error, info, instrument};

use crate::error::DispatcherError;
use crate::metrics::{MetricsSnapshot, QueueMetrics};

/// Upper bound for the initial pending allocation
const MAX_PREALLOCATED: usize = 4096;

/// Outcome of [`BulkQueue::drain`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueReport {
    /// Size of the remainder batch flushed by `drain`, if there was one
    pub final_batch: Option<usize>,
    /// Counters at the end of the run
    pub metrics: MetricsSnapshot,
}

/// Accumulates envelopes and submits them in batches of `threshold`.
///
/// Batches are contiguous runs of enqueue order. Each batch is submitted
/// exactly once; a failed submission is returned as
/// [`DispatcherError::BulkRejected`] and the batch is discarded.
pub struct BulkQueue<S> {
    sink: S,
    threshold: usize,
    pending: Vec<DispatchEnvelope>,
    metrics: Arc<QueueMetrics>,
}

impl<S: BulkSink> BulkQueue<S> {
    /// Create a queue in front of `sink`.
    ///
    /// # Errors
    /// `threshold` is zero.
    pub fn new(sink: S, threshold: usize) -> Result<Self, DispatcherError> {
        if threshold == 0 {
            return Err(DispatcherError::InvalidThreshold(threshold));
        }
        Ok(Self {
            sink,
            threshold,
            pending: Vec::with_capacity(threshold.min(MAX_PREALLOCATED)),
            metrics: Arc::new(QueueMetrics::new()),
        })
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Shared counters, readable while the queue is running
    pub fn metrics(&self) -> Arc<QueueMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Tag `document` with its destination and append it to the pending batch.
    ///
    /// Returns the size of the batch submitted by this call, if the threshold
    /// was reached.
    ///
    /// # Errors
    /// The triggered submission failed. The run must stop.
    pub async fn enqueue(
        &mut self,
        document: NormalizedDocument,
        index: &IndexName,
        metadata: &Metadata,
    ) -> Result<Option<usize>, DispatcherError> {
        self.pending
            .push(DispatchEnvelope::new(document, index.clone(), metadata.clone()));
        self.metrics.inc_enqueued_count();
        self.metrics.set_pending_len(self.pending.len());

        if self.pending.len() >= self.threshold {
            return self.flush().await.map(Some);
        }
        Ok(None)
    }

    /// Flush the remainder (if any), close the sink and report.
    ///
    /// # Errors
    /// The remainder submission failed, or the sink failed to close.
    #[instrument(name = "bulk_queue_drain", skip(self), fields(sink = %self.sink.name(), pending = self.pending.len()))]
    pub async fn drain(mut self) -> Result<QueueReport, DispatcherError> {
        let final_batch = if self.pending.is_empty() {
            None
        } else {
            Some(self.flush().await?)
        };

        self.sink.close().await?;
        debug!(sink = %self.sink.name(), "Bulk sink closed");

        Ok(QueueReport {
            final_batch,
            metrics: self.metrics.snapshot(),
        })
    }

    #[instrument(name = "bulk_queue_flush", skip(self), fields(sink = %self.sink.name(), size = self.pending.len()))]
    async fn flush(&mut self) -> Result<usize, DispatcherError> {
        let batch = std::mem::take(&mut self.pending);
        self.metrics.set_pending_len(0);
        let size = batch.len();

        match self.sink.bulk_index(&batch).await {
            Ok(()) => {
                self.metrics.record_batch(size);
                info!(
                    sink = %self.sink.name(),
                    size,
                    batches = self.metrics.batch_count(),
                    "Batch submitted"
                );
                Ok(size)
            }
            Err(e) => {
                self.metrics.inc_failure_count();
                error!(sink = %self.sink.name(), size, error = %e, "Bulk submission failed");
                Err(DispatcherError::bulk_rejected(self.sink.name(), size, e))
            }
        }
    }
}
