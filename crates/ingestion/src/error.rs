//! Ingestion error types

use std::path::PathBuf;

use thiserror::Error;

/// Ingestion errors
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Container file could not be opened or mapped
    #[error("failed to open '{path}': {source}")]
    Open {
        /// Container path
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File is not a readable EVTX container
    #[error("'{path}' is not a readable EVTX container: {message}")]
    Container {
        /// Container path
        path: PathBuf,
        /// Reader message
        message: String,
    },

    /// Record XML is not well formed
    #[error("malformed record xml: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Record XML is well formed at token level but not a single element tree
    #[error("malformed record structure: {0}")]
    Structure(String),
}

/// Ingestion Result type alias
pub type Result<T> = std::result::Result<T, IngestionError>;
