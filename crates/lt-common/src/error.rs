//! Error types for Log Triage.

use thiserror::Error;

/// Result type alias for Log Triage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for Log Triage.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid rules file: {0}")]
    InvalidRules(String),

    #[error("schema validation failed: {0}")]
    SchemaValidation(String),

    // Input errors (20-29)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    /// Used for detailed error reporting in JSON output.
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidRules(_) => 11,
            Error::SchemaValidation(_) => 12,
            Error::InvalidInput(_) => 20,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// True for errors caused by the rule table or the category selection.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Error::Config(_) | Error::InvalidRules(_) | Error::SchemaValidation(_)
        )
    }
}
