//! Error types for the BMI engine

use thiserror::Error;

/// Errors that can occur during computation, validation or export
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid measurement: {0}")]
    InvalidMeasurement(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Failed to parse value: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl EngineError {
    /// True for errors caused by the values a user typed in
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidMeasurement(_) | EngineError::MissingField(_)
        )
    }
}
