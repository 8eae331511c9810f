//! Error types for GaRSI Flux

use thiserror::Error;

/// Errors that can occur while transforming a session
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Failed to parse event log (line {line}): {message}")]
    ParseError { line: usize, message: String },

    #[error("Invalid timestamp '{0}'")]
    TimestampError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Cannot merge an empty list of ignored ranges")]
    EmptyRanges,

    #[error("Insufficient fixations for computation: {0}")]
    InsufficientFixations(String),

    #[error("Insufficient events for computation: {0}")]
    InsufficientEvents(String),

    #[error("Invalid annotation: {0}")]
    InvalidAnnotation(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ComputeError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        ComputeError::ParseError {
            line,
            message: message.into(),
        }
    }
}
