//! Error types for the fedcommit ingestion pipeline.
//!
//! Errors are organized by stage. Every stage returns its own typed failure and
//! the orchestrator surfaces the first one unchanged, so a caller can always
//! tell which check rejected a submission.

use thiserror::Error;

/// Top-level error type for fedcommit operations.
#[derive(Error, Debug)]
pub enum FedCommitError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Wire request could not be turned into a submission
    #[error("Wire error: {0}")]
    Wire(#[from] WireError),

    /// Re-derived commitment did not match
    #[error(transparent)]
    Mismatch(#[from] CommitmentMismatch),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Structural and semantic rejections of a submission.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required identifier was empty
    #[error("{field} cannot be empty")]
    EmptyField { field: &'static str },

    /// Session identifier missing or expired
    #[error("Invalid session: {reason}")]
    InvalidSession { reason: String },

    /// Image payload had no bytes
    #[error("Image data cannot be empty")]
    EmptyImage,
}

/// Rejections raised by the image codec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// Payload is not one of the accepted image formats
    #[error("Unsupported image format: {format} (only image/jpeg and image/png are accepted)")]
    UnsupportedFormat { format: String },

    /// Payload exceeds the size cap; raised before any decoding
    #[error("Payload too large: {size} bytes (max {max} bytes)")]
    PayloadTooLarge { size: u64, max: u64 },

    /// Payload claimed a supported format but could not be decoded
    #[error("Malformed image: {message}")]
    MalformedImage { message: String },
}

/// Failure of a single submission, carrying the failing stage's error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// Request validation failed
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Image admission or decoding failed
    #[error(transparent)]
    Format(#[from] FormatError),

    /// A blocking worker task died before producing a result
    #[error("Worker failure in {stage} stage: {message}")]
    Worker { stage: &'static str, message: String },

    /// The requested sub-pipeline is not enabled in configuration
    #[error("Service disabled: {service}")]
    ServiceDisabled { service: &'static str },
}

/// Coarse classification a host uses to pick a client-facing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The submission itself was rejected
    BadInput,
    /// The failure originated on the serving side
    Internal,
}

impl PipelineError {
    /// Classify the failure as client-caused or server-side.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Validation(_) | PipelineError::Format(_) => ErrorKind::BadInput,
            PipelineError::Worker { .. } | PipelineError::ServiceDisabled { .. } => {
                ErrorKind::Internal
            }
        }
    }

    /// Name of the stage that produced the failure.
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Validation(_) => "validate",
            PipelineError::Format(_) => "decode",
            PipelineError::Worker { stage, .. } => *stage,
            PipelineError::ServiceDisabled { .. } => "dispatch",
        }
    }
}

/// A commitment re-derived from the original inputs disagrees with the claim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Commitment mismatch: expected {expected}, derived {actual}")]
pub struct CommitmentMismatch {
    pub expected: String,
    pub actual: String,
}

/// Failures converting a wire request into a submission.
#[derive(Error, Debug)]
pub enum WireError {
    /// `image.data` was not valid base64
    #[error("Invalid base64 image data: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Request body was not valid JSON for the expected shape
    #[error("Invalid request body: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience type alias for fedcommit results.
pub type Result<T> = std::result::Result<T, FedCommitError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_preserved_through_from() {
        let err: PipelineError = ValidationError::EmptyImage.into();
        assert_eq!(err, PipelineError::Validation(ValidationError::EmptyImage));
        assert_eq!(err.kind(), ErrorKind::BadInput);
        assert_eq!(err.stage(), "validate");
    }

    #[test]
    fn test_transparent_message() {
        let err: PipelineError = FormatError::PayloadTooLarge { size: 11, max: 10 }.into();
        assert_eq!(err.to_string(), "Payload too large: 11 bytes (max 10 bytes)");
    }

    fn reject_empty() -> Result<()> {
        let outcome: PipelineResult<()> = Err(ValidationError::EmptyImage.into());
        outcome?;
        Ok(())
    }

    #[test]
    fn test_umbrella_result_wraps_stage_errors() {
        let err = reject_empty().unwrap_err();
        assert!(matches!(
            err,
            FedCommitError::Pipeline(PipelineError::Validation(ValidationError::EmptyImage))
        ));
        assert_eq!(err.to_string(), "Pipeline error: Image data cannot be empty");
    }

    #[test]
    fn test_worker_is_internal() {
        let err = PipelineError::Worker {
            stage: "commit",
            message: "panicked".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.stage(), "commit");
    }
}
