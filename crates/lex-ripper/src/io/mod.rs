//! Record sources and sinks.
//!
//! The ripper reads through [`RecordSource`] and writes through
//! [`RecordSink`]. CSV-backed implementations are used by the CLI; the
//! in-memory ones serve embedding and tests. [`DiscardSink`] satisfies the
//! sink contract without writing anything, so console-only runs take the
//! exact same code path as real ones.

mod sink;
mod source;

pub use sink::{CsvSink, DiscardSink, MemorySink, RecordSink, encode_field};
pub use source::{CsvSource, MemorySource, RecordSource};
