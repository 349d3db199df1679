//! Queue metrics for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Counters for one bulk queue
#[derive(Debug, Default)]
pub struct QueueMetrics {
    /// Documents currently waiting for a flush
    pending_len: AtomicUsize,
    /// Total documents accepted by `enqueue`
    enqueued_count: AtomicU64,
    /// Total successful bulk submissions
    batch_count: AtomicU64,
    /// Total documents delivered by successful submissions
    delivered_count: AtomicU64,
    /// Total failed bulk submissions
    failure_count: AtomicU64,
}

impl QueueMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_len(&self) -> usize {
        self.pending_len.load(Ordering::Relaxed)
    }

    pub fn set_pending_len(&self, len: usize) {
        self.pending_len.store(len, Ordering::Relaxed);
    }

    pub fn enqueued_count(&self) -> u64 {
        self.enqueued_count.load(Ordering::Relaxed)
    }

    pub fn inc_enqueued_count(&self) {
        self.enqueued_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn batch_count(&self) -> u64 {
        self.batch_count.load(Ordering::Relaxed)
    }

    pub fn delivered_count(&self) -> u64 {
        self.delivered_count.load(Ordering::Relaxed)
    }

    /// Record a successful submission of `size` documents
    pub fn record_batch(&self, size: usize) {
        self.batch_count.fetch_add(1, Ordering::Relaxed);
        self.delivered_count.fetch_add(size as u64, Ordering::Relaxed);
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn inc_failure_count(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            pending_len: self.pending_len(),
            enqueued_count: self.enqueued_count(),
            batch_count: self.batch_count(),
            delivered_count: self.delivered_count(),
            failure_count: self.failure_count(),
        }
    }
}

/// Snapshot of queue metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub pending_len: usize,
    pub enqueued_count: u64,
    pub batch_count: u64,
    pub delivered_count: u64,
    pub failure_count: u64,
}
