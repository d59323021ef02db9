//! Error types for the forecasting data-preparation pipeline.
//!
//! All fallible operations in the crate return [`PrepError`] through the
//! [`Result`] alias. Errors are serializable so the CLI can emit them as JSON
//! when running with `--json`.

use serde::Serialize;
use serde::ser::SerializeStruct;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the data-preparation pipeline.
#[derive(Error, Debug)]
pub enum PrepError {
    /// A required raw input file does not exist.
    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// A value column name does not carry a parseable time suffix.
    #[error("Column '{column}' does not match '{prefix}<integer>'")]
    InvalidColumnName { column: String, prefix: String },

    /// The input table cannot be processed as requested.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// `test_size` is neither a proportion in (0, 1) nor a positive count.
    #[error("Invalid test_size {0}: expected a proportion in (0, 1) or a positive integer count")]
    InvalidTestSize(String),

    /// A series has fewer observations than the requested test partition.
    #[error(
        "test_size {requested} exceeds the {available} observations of series '{series_id}'"
    )]
    TestSizeTooLarge {
        series_id: String,
        requested: usize,
        available: usize,
    },

    /// Parallel sequences passed to a metric differ in length.
    #[error("Length mismatch: y_true has {expected} values, y_pred has {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PrepError>,
    },
}

impl PrepError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PrepError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code, used in logs and JSON output.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InputNotFound(_) => "INPUT_NOT_FOUND",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::InvalidColumnName { .. } => "INVALID_COLUMN_NAME",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::InvalidTestSize(_) => "INVALID_TEST_SIZE",
            Self::TestSizeTooLarge { .. } => "TEST_SIZE_TOO_LARGE",
            Self::LengthMismatch { .. } => "LENGTH_MISMATCH",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error is a `test_size` validation failure of either kind.
    pub fn is_validation(&self) -> bool {
        match self {
            Self::InvalidTestSize(_) | Self::TestSizeTooLarge { .. } => true,
            Self::WithContext { source, .. } => source.is_validation(),
            _ => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for PrepError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("PrepError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PrepError>;

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

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| PrepError::Polars(e).with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| PrepError::Io(e).with_context(context))
    }
}
