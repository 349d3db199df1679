//! # Dispatcher
//!
//! Document delivery.
//!
//! Responsibilities:
//! - Accumulate normalized documents into bounded batches (`BulkQueue`)
//! - Submit each batch once, all-or-nothing, and stop the run on failure
//! - Provide sinks: Elasticsearch bulk API, JSON-lines export, debug print

pub mod error;
pub mod metrics;
pub mod queue;
pub mod sinks;

pub use contracts::{BulkSink, DispatchEnvelope, DocumentSink, NormalizedDocument};
pub use error::DispatcherError;
pub use metrics::{MetricsSnapshot, QueueMetrics};
pub use queue::{BulkQueue, QueueReport};
pub use sinks::{ElasticsearchConfig, ElasticsearchSink, FileSink, MemorySink, PrintSink};
