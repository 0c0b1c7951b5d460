//! Error types for the transcription engine

use std::fmt;

/// Custom error type for transcription engine failures
///
/// Only fundamentally invalid input surfaces as an error. Numeric edge
/// cases inside the pipeline (zero-energy band, failed periodicity
/// estimate, exhausted threshold ladder) are absorbed by documented
/// fallbacks and reported through [`crate::analysis::QualityReport`].
#[derive(Debug, Clone)]
pub enum EngineError {
    /// E001: Empty or zero-length sample buffer
    EmptyInput,
    /// E002: Sample buffer contains NaN or infinite values
    NonFiniteInput(usize),
    /// E003: Configuration validation failed
    ConfigValidationFailed(String),
    /// E004: STFT processing error
    StftProcessingError(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::EmptyInput => {
                write!(f, "E001: Empty sample buffer - nothing to transcribe")
            }
            EngineError::NonFiniteInput(idx) => {
                write!(f, "E002: Non-finite sample at index {}", idx)
            }
            EngineError::ConfigValidationFailed(msg) => {
                write!(f, "E003: Configuration validation failed - {}", msg)
            }
            EngineError::StftProcessingError(msg) => {
                write!(f, "E004: STFT processing error - {}", msg)
            }
        }
    }
}

impl std::error::Error for EngineError {}

impl From<anyhow::Error> for EngineError {
    fn from(err: anyhow::Error) -> Self {
        EngineError::ConfigValidationFailed(format!("{}", err))
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
