//! # Ingestion
//!
//! Record container reading.
//!
//! Responsibilities:
//! - Memory-map an EVTX container and walk its records in order
//! - Convert each rendered record XML into a `RecordValue` tree
//! - Provide an in-memory source with the same interface for tests
//!
//! ## Usage Example
//!
//! ```ignore
//! use contracts::RecordSource;
//! use ingestion::EvtxSource;
//!
//! let mut source = EvtxSource::open("Security.evtx")?;
//! for record in source.records() {
//!     match record {
//!         Ok(record) => println!("{}", record.record_id),
//!         Err(e) => eprintln!("skipping: {e}"),
//!     }
//! }
//! ```

mod error;
mod memory;
mod source;
mod xml;

// Re-exports
pub use contracts::{RawRecord, RecordSource};
pub use error::{IngestionError, Result};
pub use memory::MemorySource;
pub use source::EvtxSource;
pub use xml::parse_record_xml;
