//! Error types for the event association engine.

use thiserror::Error;

/// Result type for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for library operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A dependency line, parse tree or document could not be decoded.
    #[error("malformed input in {context}: {reason}")]
    MalformedInput { context: String, reason: String },

    /// Incompatible or missing settings, detected before processing starts.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Persistence file with an unexpected layout.
    #[error("parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a malformed input error.
    #[must_use]
    pub fn malformed(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            context: context.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a parse error.
    #[must_use]
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Whether the error only invalidates the current sentence or document.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::MalformedInput { .. } | Self::Json(_))
    }
}
