//! Sink implementations
//!
//! Contains ElasticsearchSink, FileSink, PrintSink and MemorySink.

mod elasticsearch;
mod file;
mod memory;
mod print;

pub use self::elasticsearch::{ElasticsearchConfig, ElasticsearchSink};
pub use self::file::FileSink;
pub use self::memory::{MemorySink, SubmittedBatches};
pub use self::print::PrintSink;
