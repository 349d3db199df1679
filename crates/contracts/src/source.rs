//! RecordSource trait - record container abstraction
//!
//! Decouples the pipeline from the container reader. Real EVTX files and
//! in-memory fixtures use the same interface.

use crate::{ContractError, RawRecord};

/// Sequential, single-pass source of record trees
///
/// A failing item concerns one record only; iteration may continue after it.
///
/// # Example
///
/// ```ignore
/// let mut source = EvtxSource::open(path)?;
/// for record in source.records() {
///     let record = record?;
///     println!("{}", record.record_id);
/// }
/// ```
pub trait RecordSource {
    /// Source name (file path or fixture label)
    fn name(&self) -> &str;

    /// Iterate records in container order
    fn records(&mut self) -> Box<dyn Iterator<Item = Result<RawRecord, ContractError>> + '_>;
}
