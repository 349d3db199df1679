//! # Contracts
//!
//! Shared interface contracts between the pipeline stages.
//! Stage crates depend only on this crate, never on each other.
//!
//! ## Data flow
//! - `RecordSource` yields `RawRecord` trees
//! - the normalizer turns each tree into a `NormalizedDocument`
//! - documents reach a `DocumentSink` directly, or a `BulkSink` as `DispatchEnvelope` batches

mod document;
mod error;
mod index_name;
mod record;
mod settings;
mod sink;
mod source;

pub use document::*;
pub use error::*;
pub use index_name::IndexName;
pub use record::*;
pub use settings::*;
pub use sink::*;
pub use source::RecordSource;
