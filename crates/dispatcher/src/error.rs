//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Batch threshold must be positive
    #[error("invalid batch threshold {0}, must be at least 1")]
    InvalidThreshold(usize),

    /// Sink creation error
    #[error("failed to create sink '{name}': {message}")]
    SinkCreation { name: String, message: String },

    /// A bulk submission failed; the run cannot continue
    #[error("bulk submission of {batch_size} documents to '{sink_name}' failed: {source}")]
    BulkRejected {
        sink_name: String,
        batch_size: usize,
        #[source]
        source: contracts::ContractError,
    },

    /// Sink error (from contract)
    #[error("sink error: {0}")]
    Contract(#[from] contracts::ContractError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DispatcherError {
    /// Create a sink creation error
    pub fn sink_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a bulk rejection error
    pub fn bulk_rejected(
        sink_name: impl Into<String>,
        batch_size: usize,
        source: contracts::ContractError,
    ) -> Self {
        Self::BulkRejected {
            sink_name: sink_name.into(),
            batch_size,
            source,
        }
    }
}
