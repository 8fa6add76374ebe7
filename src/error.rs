use std::fmt;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FluxError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationError),
    #[error("Transport error: {0}")]
    TransportError(String),
    #[error("Response error: {0}")]
    ResponseError(String),
    #[error("Request {request_id} did not complete within {waited:?}")]
    Timeout { request_id: String, waited: Duration },
    #[error("Persistence error: {0}")]
    PersistenceError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<reqwest::Error> for FluxError {
    fn from(e: reqwest::Error) -> Self {
        FluxError::TransportError(e.to_string())
    }
}

impl From<serde_json::Error> for FluxError {
    fn from(e: serde_json::Error) -> Self {
        FluxError::SerializationError(e.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    OutOfRange,
    MissingPair,
    Conflict,
    EmptyPrompt,
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValidationErrorKind::OutOfRange => "out of range",
            ValidationErrorKind::MissingPair => "missing pair",
            ValidationErrorKind::Conflict => "conflict",
            ValidationErrorKind::EmptyPrompt => "empty prompt",
        };
        f.write_str(name)
    }
}

/// An option set that was rejected before any request was sent.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub message: String,
}

impl ValidationError {
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn out_of_range(message: impl Into<String>) -> Self {
        Self::new(ValidationErrorKind::OutOfRange, message)
    }

    pub fn missing_pair(message: impl Into<String>) -> Self {
        Self::new(ValidationErrorKind::MissingPair, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ValidationErrorKind::Conflict, message)
    }

    pub fn empty_prompt(message: impl Into<String>) -> Self {
        Self::new(ValidationErrorKind::EmptyPrompt, message)
    }
}

pub type Result<T> = std::result::Result<T, FluxError>;
