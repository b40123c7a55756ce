//! Log ingestion and observation grouping

pub mod grouping;
pub mod parser;

pub use grouping::{group_records, GroupingReport};
pub use parser::{parse_batches, parse_records, read_records, LogBatch, LogRecord};
