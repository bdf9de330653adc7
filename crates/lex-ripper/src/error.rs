//! Error types for the text ripper.
//!
//! Every fatal condition of a run maps to one variant of [`RipperError`].
//! Stage failures carry the row number and the name of the unit that failed,
//! so the caller can print the error and exit without further lookups.
//!
//! Errors are serializable as `{code, message}` so a run summary or a
//! wrapping service can forward them as JSON.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

use crate::config::ConfigValidationError;
use crate::filters::FilterError;
use crate::tokenizer::TokenizeError;

/// Which half of the filter chain a failing unit belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterStage {
    /// Text filter applied before tokenization.
    Pre,
    /// Token filter or plugin applied after tokenization.
    Post,
}

impl std::fmt::Display for FilterStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pre => f.write_str("pre-filter"),
            Self::Post => f.write_str("post-filter"),
        }
    }
}

/// The main error type for the ripper.
#[derive(Error, Debug)]
pub enum RipperError {
    /// A required setup parameter is missing or invalid.
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigValidationError),

    /// The target column does not exist in the source header.
    #[error("Column '{0}' not found in input header")]
    ColumnNotFound(String),

    /// The custom dictionary could not be read or parsed.
    #[error("Failed to load dictionary '{path}': {reason}")]
    DictionaryLoad { path: String, reason: String },

    /// Reading from the record source failed.
    #[error("Failed to read input at row {row}: {reason}")]
    SourceRead { row: u64, reason: String },

    /// Writing to the record sink failed.
    #[error("Failed to write output at row {row}: {reason}")]
    SinkWrite { row: u64, reason: String },

    /// A filter unit rejected a record.
    #[error("{stage} '{name}' failed at row {row}: {source}")]
    Filter {
        stage: FilterStage,
        name: String,
        row: u64,
        #[source]
        source: FilterError,
    },

    /// The tokenizer rejected a record.
    #[error("Tokenizer '{name}' failed at row {row}: {source}")]
    Tokenize {
        name: String,
        row: u64,
        #[source]
        source: TokenizeError,
    },

    /// An operation was called in a state that does not allow it.
    #[error("Cannot {operation} while ripper is {state}")]
    Sequence {
        operation: &'static str,
        state: String,
    },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<RipperError>,
    },
}

impl RipperError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        RipperError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable machine-readable code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::ColumnNotFound(_) => "CONFIG_ERROR",
            Self::DictionaryLoad { .. } => "DICTIONARY_LOAD_ERROR",
            Self::SourceRead { .. } => "SOURCE_READ_ERROR",
            Self::SinkWrite { .. } => "SINK_WRITE_ERROR",
            Self::Filter { .. } => "FILTER_ERROR",
            Self::Tokenize { .. } => "TOKENIZE_ERROR",
            Self::Sequence { .. } => "SEQUENCE_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// True for API misuse rather than a runtime condition.
    pub fn is_sequence_error(&self) -> bool {
        match self {
            Self::Sequence { .. } => true,
            Self::WithContext { source, .. } => source.is_sequence_error(),
            _ => false,
        }
    }

    /// True when the run never started because setup was rejected.
    pub fn is_setup_error(&self) -> bool {
        matches!(
            self.error_code(),
            "CONFIG_ERROR" | "DICTIONARY_LOAD_ERROR"
        )
    }

    pub(crate) fn sequence(operation: &'static str, state: impl std::fmt::Display) -> Self {
        Self::Sequence {
            operation,
            state: state.to_string(),
        }
    }
}

impl Serialize for RipperError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("RipperError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for ripper operations.
pub type Result<T> = std::result::Result<T, RipperError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| RipperError::Io(e).with_context(context))
    }
}
