//! Pipeline module.
//!
//! This module provides the [`Ripper`] orchestrator, row assembly, progress
//! monitoring, and the [`run`] helper that drives a whole file-backed run.

pub mod assembler;
pub mod progress;
mod ripper;

pub use assembler::{RowAssembler, join_tokens, output_header};
pub use progress::{
    ClosureProgressReporter, LogProgressReporter, PositionCounter, ProgressMonitor,
    ProgressReporter, ThroughputSample, ThroughputTracker,
};
pub use ripper::{Ripper, RipperBuilder, RipperState};

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::info;

use crate::config::RipperConfig;
use crate::error::Result;
use crate::filters::FilterSet;
use crate::types::OutputMode;

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub rows_processed: u64,
    pub duration_ms: u64,
    /// Unrounded; `Display` shows two decimals.
    pub rows_per_second: f64,
    pub replace: bool,
    /// Output file, or `None` when rows were discarded.
    pub output: Option<String>,
}

impl RunSummary {
    fn new(rows_processed: u64, elapsed: std::time::Duration, config: &RipperConfig) -> Self {
        let secs = elapsed.as_secs_f64();
        Self {
            rows_processed,
            duration_ms: elapsed.as_millis() as u64,
            rows_per_second: if secs > 0.0 {
                rows_processed as f64 / secs
            } else {
                0.0
            },
            replace: config.mode == OutputMode::Replace,
            output: config.output.as_ref().map(|p| p.display().to_string()),
        }
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Processed {} rows in {:.2}s ({:.2} rows/s)",
            self.rows_processed,
            self.duration_ms as f64 / 1000.0,
            self.rows_per_second
        )?;
        match &self.output {
            Some(path) => write!(f, " -> {}", path),
            None => f.write_str(" (output discarded)"),
        }
    }
}

/// Run a whole file-backed job: set up, register `filters`, write the
/// header, process every record, close.
///
/// The units in `filters` are registered after the stop-word filter that
/// `config.stopwords` adds. Pass [`FilterSet::default()`] for a plain run.
pub fn run(
    config: &RipperConfig,
    filters: FilterSet,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<RunSummary> {
    let started = Instant::now();

    let mut ripper = Ripper::from_config(config)?;
    ripper.add_filters(filters)?;
    ripper.set_progress_reporter(reporter)?;
    ripper.write_header(config.mode)?;
    let rows = ripper.process_stream()?;
    ripper.close()?;

    let summary = RunSummary::new(rows, started.elapsed(), config);
    info!("{}", summary);
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    fn config(output: Option<&str>) -> RipperConfig {
        RipperConfig {
            input: PathBuf::from("in.csv"),
            output: output.map(PathBuf::from),
            column: "text".to_string(),
            show: output.is_none(),
            ..RipperConfig::default()
        }
    }

    #[test]
    fn test_summary_rate_and_display() {
        let summary = RunSummary::new(10, Duration::from_secs(30), &config(Some("out.csv")));
        assert!((summary.rows_per_second - 10.0 / 30.0).abs() < 1e-9);
        assert_eq!(
            summary.to_string(),
            "Processed 10 rows in 30.00s (0.33 rows/s) -> out.csv"
        );
    }

    #[test]
    fn test_summary_zero_duration() {
        let summary = RunSummary::new(5, Duration::ZERO, &config(None));
        assert_eq!(summary.rows_per_second, 0.0);
        assert!(summary.to_string().ends_with("(output discarded)"));
    }

    #[test]
    fn test_summary_serialization() {
        let summary = RunSummary::new(2, Duration::from_millis(500), &config(None));
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["rows_processed"], 2);
        assert_eq!(json["duration_ms"], 500);
        assert_eq!(json["replace"], false);
        assert!(json["output"].is_null());
    }
}
