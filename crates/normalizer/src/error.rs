//! Normalizer error types

use thiserror::Error;

/// Per-record normalization failure. The record is dropped, the run continues.
#[derive(Debug, Error)]
pub enum NormalizationError {
    /// No `System/TimeCreated/@SystemTime` text in the record
    #[error("record has no System/TimeCreated/@SystemTime field")]
    MissingTimestamp,

    /// Timestamp text matches neither accepted format
    #[error("malformed SystemTime '{value}': {source}")]
    MalformedTimestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// A payload could not be rendered as a `RawData` string
    #[error("failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl NormalizationError {
    /// Short label for metrics and structured logs
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingTimestamp => "missing_timestamp",
            Self::MalformedTimestamp { .. } => "malformed_timestamp",
            Self::Serialize(_) => "serialize",
        }
    }
}
