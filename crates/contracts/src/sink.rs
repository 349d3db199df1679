//! Sink traits - output interfaces
//!
//! `DocumentSink` receives documents one at a time (export, debug print).
//! `BulkSink` receives whole batches from the dispatch queue.

use crate::{ContractError, DispatchEnvelope, NormalizedDocument};

/// Per-document output trait
#[trait_variant::make(DocumentSink: Send)]
pub trait LocalDocumentSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write one normalized document
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, document: &NormalizedDocument) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}

/// Bulk-indexing output trait
///
/// A call either accepts the whole batch or fails; there is no partial success
/// from the caller's point of view.
#[trait_variant::make(BulkSink: Send)]
pub trait LocalBulkSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Submit one batch in a single request
    async fn bulk_index(&mut self, batch: &[DispatchEnvelope]) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
