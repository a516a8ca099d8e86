//! Error types for the listings normalizer

use thiserror::Error;

/// Result type alias for normalizer operations
pub type Result<T> = std::result::Result<T, ListingsError>;

/// Main error type for loading and normalizing listings
#[derive(Error, Debug)]
pub enum ListingsError {
    /// The data source is missing or cannot be read. Callers cannot proceed
    /// without data, so this is terminal.
    #[error("Source unavailable: {path}: {reason}")]
    SourceUnavailable { path: String, reason: String },

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl ListingsError {
    /// Build a `SourceUnavailable` error for `path`
    pub fn source_unavailable(path: impl Into<String>, reason: impl ToString) -> Self {
        ListingsError::SourceUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error means the dataset could not be obtained at all
    pub fn is_source_unavailable(&self) -> bool {
        matches!(self, ListingsError::SourceUnavailable { .. })
    }
}

impl From<polars::error::PolarsError> for ListingsError {
    fn from(err: polars::error::PolarsError) -> Self {
        ListingsError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for ListingsError {
    fn from(err: serde_json::Error) -> Self {
        ListingsError::SerializationError(err.to_string())
    }
}
