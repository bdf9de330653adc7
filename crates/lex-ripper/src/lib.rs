//! Text Ripper Library
//!
//! Streams CSV records, tokenizes one column with a dictionary-backed
//! tokenizer, and writes the result back into the record stream.
//!
//! # Overview
//!
//! - **Record IO**: CSV source and sink, plus in-memory and discard variants
//! - **Tokenization**: longest-match segmentation against a replaceable
//!   dictionary, with a small built-in dictionary as fallback
//! - **Filter Chain**: ordered text filters before tokenization, ordered
//!   plugins and post-filters after it
//! - **Output Assembly**: replace the column in place or append a tokenized
//!   column, with per-column forced quoting
//! - **Progress Reporting**: a background monitor samples throughput while
//!   the stream is processed
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use lex_ripper::{FilterSet, LogProgressReporter, RipperConfig, run};
//! use lex_ripper::filters::NormalizeWhitespace;
//! use std::sync::Arc;
//!
//! let config = RipperConfig::builder()
//!     .input("reviews.csv")
//!     .output("reviews_tokenized.csv")
//!     .column("body")
//!     .quote_columns(["body_tokenized"])
//!     .build()?;
//!
//! let filters = FilterSet::new().pre_filter(NormalizeWhitespace);
//! let summary = run(&config, filters, Arc::new(LogProgressReporter))?;
//! println!("{summary}");
//! ```
//!
//! # Custom Pipelines
//!
//! Build a [`Ripper`] directly to plug in your own sources, sinks and filters:
//!
//! ```rust,ignore
//! use lex_ripper::*;
//! use lex_ripper::filters::{FnTokenFilter, MinLength, NormalizeWhitespace};
//!
//! let sink = MemorySink::new();
//! let mut ripper = Ripper::builder()
//!     .source(CsvSource::open("reviews.csv")?)
//!     .sink(sink.clone())
//!     .column("body")
//!     .dictionary_path("custom_dic.csv")
//!     .on_progress(|sample| eprintln!("{sample}"))
//!     .build()?;
//!
//! ripper.add_pre_filter(NormalizeWhitespace)?;
//! ripper.add_plugin(FnTokenFilter::new("no-digits", |tokens| {
//!     Ok(tokens.into_iter().filter(|t| !t.surface.chars().all(char::is_numeric)).collect())
//! }))?;
//! ripper.add_post_filter(MinLength::new(2))?;
//!
//! ripper.write_header(OutputMode::Replace)?;
//! ripper.process_stream()?;
//! ripper.close()?;
//! ```

pub mod config;
pub mod error;
pub mod filters;
pub mod io;
pub mod pipeline;
pub mod tokenizer;
pub mod types;

// Re-exports for convenient access
pub use config::{ConfigValidationError, EchoTarget, RipperConfig, RipperConfigBuilder};
pub use error::{FilterStage, Result as RipperResult, ResultExt, RipperError};
pub use filters::{
    FilterError, FilterSet, FnTextFilter, FnTokenFilter, TextFilter, TokenFilter,
};
pub use io::{CsvSink, CsvSource, DiscardSink, MemorySink, MemorySource, RecordSink, RecordSource};
pub use pipeline::{
    ClosureProgressReporter, LogProgressReporter, PositionCounter, ProgressReporter, Ripper,
    RipperBuilder, RipperState, RunSummary, ThroughputSample, run,
};
pub use tokenizer::{
    Dictionary, DictionaryTokenizer, TokenizeError, Tokenizer, WhitespaceTokenizer,
};
pub use types::{Cell, Header, OutputMode, OutputRow, Record, Token, TokenClass};
