//! Ingestion pipeline components.
//!
//! This module contains all the stages of the ingestion pipeline:
//! - **validate**: Structural and session checks on a submission
//! - **decode**: Payload admission and JPEG/PNG decoding
//! - **extract**: Versioned feature extraction
//! - **commit**: Canonical SHA-256 commitments and transaction records
//! - **processor**: Orchestrates the full pipeline

pub mod commit;
pub mod decode;
pub mod extract;
pub mod processor;
pub mod validate;

// Re-exports for convenient access
pub use commit::CommitmentBuilder;
pub use decode::{DecodedImage, ImageDecoder, PixelFormat, SupportedFormat};
pub use extract::{
    extractor_for_version, DimensionExtractor, FeatureExtractor, LumaHistogramExtractor,
};
pub use processor::{Pipeline, PipelineOutput};
pub use validate::Validator;
