//! Configuration types for a ripper run.
//!
//! This module provides [`RipperConfig`] and its builder. A configuration
//! describes where records come from, where they go, which column is
//! tokenized, and how the output is shaped.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, ResultExt};
use crate::types::OutputMode;

/// Default seconds between progress samples.
pub const DEFAULT_PROGRESS_INTERVAL_SECS: u64 = 30;

/// Default separator placed between surviving token surfaces.
pub const DEFAULT_SEPARATOR: &str = " ";

/// Default suffix of the column added in append mode.
pub const DEFAULT_SUFFIX: &str = "_tokenized";

/// Stream that receives `show` and `debug` lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EchoTarget {
    #[default]
    Stdout,
    /// Keeps stdout free for machine-readable output such as `--json`.
    Stderr,
}

/// Configuration for a ripper run.
///
/// Use [`RipperConfig::builder()`] to create a validated configuration.
///
/// # Example
///
/// ```rust,ignore
/// use lex_ripper::config::RipperConfig;
///
/// let config = RipperConfig::builder()
///     .input("reviews.csv")
///     .output("reviews_tokenized.csv")
///     .column("body")
///     .quote_columns(["body"])
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RipperConfig {
    /// CSV file to read.
    pub input: PathBuf,

    /// CSV file to write. `None` discards output, which is only allowed
    /// together with `show` or `debug`.
    pub output: Option<PathBuf>,

    /// Name of the column whose text is tokenized.
    pub column: String,

    /// Custom dictionary file. `None` uses the built-in dictionary.
    pub dictionary: Option<PathBuf>,

    /// Output columns that are always wrapped in double quotes.
    pub quote_columns: Vec<String>,

    /// Replace the target column or append a tokenized column.
    /// Default: Append
    pub mode: OutputMode,

    /// Print the separated words of every row.
    pub show: bool,

    /// Print token details of every row.
    pub debug: bool,

    /// Where `show` and `debug` lines go.
    /// Default: stdout
    pub echo: EchoTarget,

    /// Seconds between progress samples; 0 disables the monitor.
    /// Default: 30
    pub progress_interval_secs: u64,

    /// Text placed between token surfaces when reassembling a row.
    /// Default: a single space
    pub separator: String,

    /// Suffix of the appended column name.
    /// Default: "_tokenized"
    pub suffix: String,

    /// Stop-word list (one word per line) registered as a post-filter.
    pub stopwords: Option<PathBuf>,
}

impl Default for RipperConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output: None,
            column: String::new(),
            dictionary: None,
            quote_columns: Vec::new(),
            mode: OutputMode::default(),
            show: false,
            debug: false,
            echo: EchoTarget::default(),
            progress_interval_secs: DEFAULT_PROGRESS_INTERVAL_SECS,
            separator: DEFAULT_SEPARATOR.to_string(),
            suffix: DEFAULT_SUFFIX.to_string(),
            stopwords: None,
        }
    }
}

impl RipperConfig {
    /// Create a new configuration builder.
    pub fn builder() -> RipperConfigBuilder {
        RipperConfigBuilder::default()
    }

    /// Load and validate a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .context(format!("reading config '{}'", path.display()))?;
        let config: RipperConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// True when rows are processed but not written anywhere.
    pub fn discards_output(&self) -> bool {
        self.output.is_none()
    }

    /// Name of the column added in append mode.
    pub fn appended_column(&self) -> String {
        format!("{}{}", self.column, self.suffix)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        if self.input.as_os_str().is_empty() {
            return Err(ConfigValidationError::MissingInput);
        }

        if self.output.is_none() && !self.show && !self.debug {
            return Err(ConfigValidationError::MissingOutput);
        }

        validate_column(&self.column)?;

        if self.mode == OutputMode::Append && self.suffix.is_empty() {
            return Err(ConfigValidationError::EmptySuffix);
        }

        if let Some(name) = self.quote_columns.iter().find(|c| c.trim().is_empty()) {
            return Err(ConfigValidationError::InvalidQuoteColumn(name.clone()));
        }

        Ok(())
    }
}

pub(crate) fn validate_column(column: &str) -> std::result::Result<(), ConfigValidationError> {
    if column.trim().is_empty() {
        return Err(ConfigValidationError::MissingColumn);
    }
    Ok(())
}

/// Errors that can occur during configuration validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("no input file (use --input <path>)")]
    MissingInput,

    #[error("no output file (use --output <path>, or --show / --debug to discard output)")]
    MissingOutput,

    #[error("no column name (use --column <name>)")]
    MissingColumn,

    #[error("append mode needs a non-empty column suffix")]
    EmptySuffix,

    #[error("invalid quote column name '{0}'")]
    InvalidQuoteColumn(String),

    #[error("appended column '{0}' already exists in the input header")]
    DuplicateColumn(String),
}

/// Builder for [`RipperConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct RipperConfigBuilder {
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    column: Option<String>,
    dictionary: Option<PathBuf>,
    quote_columns: Option<Vec<String>>,
    mode: Option<OutputMode>,
    show: Option<bool>,
    debug: Option<bool>,
    echo: Option<EchoTarget>,
    progress_interval_secs: Option<u64>,
    separator: Option<String>,
    suffix: Option<String>,
    stopwords: Option<PathBuf>,
}

impl RipperConfigBuilder {
    pub fn input(mut self, path: impl Into<PathBuf>) -> Self {
        self.input = Some(path.into());
        self
    }

    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    pub fn column(mut self, name: impl Into<String>) -> Self {
        self.column = Some(name.into());
        self
    }

    pub fn dictionary(mut self, path: impl Into<PathBuf>) -> Self {
        self.dictionary = Some(path.into());
        self
    }

    /// Set the columns that are always quoted on output.
    pub fn quote_columns<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.quote_columns = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn mode(mut self, mode: OutputMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Shorthand for `mode(OutputMode::Replace)` when `replace` is true.
    pub fn replace(mut self, replace: bool) -> Self {
        self.mode = Some(OutputMode::from_replace_flag(replace));
        self
    }

    pub fn show(mut self, show: bool) -> Self {
        self.show = Some(show);
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = Some(debug);
        self
    }

    pub fn echo(mut self, target: EchoTarget) -> Self {
        self.echo = Some(target);
        self
    }

    /// Set the progress sampling interval. 0 disables progress reporting.
    pub fn progress_interval_secs(mut self, secs: u64) -> Self {
        self.progress_interval_secs = Some(secs);
        self
    }

    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = Some(separator.into());
        self
    }

    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    pub fn stopwords(mut self, path: impl Into<PathBuf>) -> Self {
        self.stopwords = Some(path.into());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `RipperConfig` or an error if validation fails.
    pub fn build(self) -> std::result::Result<RipperConfig, ConfigValidationError> {
        let config = RipperConfig {
            input: self.input.unwrap_or_default(),
            output: self.output,
            column: self.column.unwrap_or_default(),
            dictionary: self.dictionary,
            quote_columns: self.quote_columns.unwrap_or_default(),
            mode: self.mode.unwrap_or_default(),
            show: self.show.unwrap_or(false),
            debug: self.debug.unwrap_or(false),
            echo: self.echo.unwrap_or_default(),
            progress_interval_secs: self
                .progress_interval_secs
                .unwrap_or(DEFAULT_PROGRESS_INTERVAL_SECS),
            separator: self
                .separator
                .unwrap_or_else(|| DEFAULT_SEPARATOR.to_string()),
            suffix: self.suffix.unwrap_or_else(|| DEFAULT_SUFFIX.to_string()),
            stopwords: self.stopwords,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> RipperConfigBuilder {
        RipperConfig::builder()
            .input("in.csv")
            .output("out.csv")
            .column("text")
    }

    #[test]
    fn test_builder_defaults() {
        let config = minimal().build().unwrap();
        assert_eq!(config.mode, OutputMode::Append);
        assert_eq!(config.progress_interval_secs, 30);
        assert_eq!(config.separator, " ");
        assert_eq!(config.appended_column(), "text_tokenized");
        assert!(!config.discards_output());
        assert_eq!(config.echo, EchoTarget::Stdout);
    }

    #[test]
    fn test_validation_missing_column() {
        let result = RipperConfig::builder()
            .input("in.csv")
            .output("out.csv")
            .column("  ")
            .build();
        assert_eq!(result.unwrap_err(), ConfigValidationError::MissingColumn);
    }

    #[test]
    fn test_validation_missing_output_without_console_mode() {
        let result = RipperConfig::builder()
            .input("in.csv")
            .column("text")
            .build();
        assert_eq!(result.unwrap_err(), ConfigValidationError::MissingOutput);
    }

    #[test]
    fn test_show_mode_allows_discarded_output() {
        let config = RipperConfig::builder()
            .input("in.csv")
            .column("text")
            .show(true)
            .build()
            .unwrap();
        assert!(config.discards_output());
    }

    #[test]
    fn test_validation_empty_suffix_only_matters_in_append_mode() {
        assert_eq!(
            minimal().suffix("").build().unwrap_err(),
            ConfigValidationError::EmptySuffix
        );
        assert!(minimal().suffix("").replace(true).build().is_ok());
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "input": "reviews.csv",
            "column": "body",
            "debug": true,
            "mode": "replace",
            "quote_columns": ["body", "title"],
            "progress_interval_secs": 5
        }"#;

        let config: RipperConfig = serde_json::from_str(json).expect("Should deserialize");
        config.validate().expect("Should validate");

        assert_eq!(config.column, "body");
        assert_eq!(config.mode, OutputMode::Replace);
        assert_eq!(config.quote_columns, vec!["body", "title"]);
        assert_eq!(config.progress_interval_secs, 5);
        assert_eq!(config.separator, " ");
        assert!(config.discards_output());
    }

    #[test]
    fn test_echo_target_from_json() {
        let json = r#"{"input": "in.csv", "column": "text", "show": true, "echo": "stderr"}"#;
        let config: RipperConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.echo, EchoTarget::Stderr);
    }
}
