//! fedcommit core - telemetry ingestion for federated edge devices.
//!
//! Edge devices submit an image together with device, user and session
//! identifiers. The pipeline validates the submission, turns the image into a
//! versioned feature vector, and produces a deterministic SHA-256 commitment
//! binding identity, context and image content for later ledger verification.
//!
//! # Architecture
//!
//! ```text
//! Submission → Validate → Admit ─┬─ Decode → Extract → ImageToVectorResult
//!                                └─ Commit           → TransactionRecord
//! ```
//!
//! Nothing is persisted and no network I/O happens here; hosts feed
//! submissions in and ship the results wherever they need to go.
//!
//! # Usage
//!
//! ```rust,no_run
//! use fedcommit_core::{Config, Pipeline, SubmissionRequest};
//!
//! async fn ingest(body: &str) -> fedcommit_core::Result<()> {
//!     let config = Config::load()?;
//!     let pipeline = Pipeline::new(&config)?;
//!
//!     let submission = SubmissionRequest::from_json(body)?.into_submission()?;
//!     let output = pipeline.process(submission).await?;
//!     if let Some(record) = output.transaction {
//!         println!("commitment: {}", record.hash_value());
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod types;
pub mod wire;

// Re-exports for convenient access
pub use config::Config;
pub use error::{
    CommitmentMismatch, ConfigError, ErrorKind, FedCommitError, FormatError, PipelineError,
    PipelineResult, Result, ValidationError, WireError,
};
pub use output::{OutputFormat, OutputWriter};
pub use pipeline::{CommitmentBuilder, FeatureExtractor, Pipeline, PipelineOutput};
pub use types::{
    Commitment, CommitmentResult, FeatureVector, ImagePayload, ImageToVectorResult, Settings,
    Submission, TransactionRecord,
};
pub use wire::{SubmissionRequest, SubmissionResponse};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
