//! # Normalizer
//!
//! Record normalization: one raw record tree in, one flat document out.
//!
//! Responsibilities:
//! - Extract and rewrite the `System/TimeCreated/@SystemTime` timestamp
//! - Flatten `EventData/Data` into a stable, searchable shape
//! - Canonicalize the tree into plain JSON
//!
//! Pure transform, no I/O.
//!
//! ## Usage Example
//!
//! ```ignore
//! use normalizer::normalize;
//!
//! match normalize(&record) {
//!     Ok(document) => queue.enqueue(document, &index, &metadata).await?,
//!     Err(e) => warn!(record_id = record.record_id, error = %e, "Dropping record"),
//! }
//! ```

mod error;
mod flatten;
mod normalize;
mod timestamp;

pub use error::NormalizationError;
pub use flatten::{classify, PayloadShape};
pub use normalize::normalize;
pub use timestamp::{parse_system_time, to_iso8601};
