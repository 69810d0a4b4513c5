//! Pipeline orchestration - wires together all processing stages.
//!
//! ```text
//! Submission → Validate → Admit ─┬─ Decode → Crop → Extract  (vector path)
//!                                └─ Commit                    (commitment path)
//! ```
//!
//! The two paths share the validated submission and nothing else, so they run
//! side by side on blocking worker threads and are joined before returning.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;

use crate::config::{Config, ServicesConfig};
use crate::error::{ConfigError, PipelineError, PipelineResult};
use crate::types::{ImageToVectorResult, Submission, TransactionRecord};

use super::commit::CommitmentBuilder;
use super::decode::{ImageDecoder, SupportedFormat};
use super::extract::{extractor_for_version, FeatureExtractor};
use super::validate::Validator;

/// Results of one submission, one entry per enabled sub-pipeline.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Vector-path result, present when the vector service is enabled
    pub vector: Option<ImageToVectorResult>,
    /// Commitment-path result, present when the commitment service is enabled
    pub transaction: Option<TransactionRecord>,
}

/// The ingestion pipeline. Holds no per-submission state and can be shared
/// across any number of concurrent callers.
pub struct Pipeline {
    services: ServicesConfig,
    validator: Validator,
    decoder: ImageDecoder,
    extractor: Arc<dyn FeatureExtractor>,
}

impl Pipeline {
    /// Assemble the pipeline from configuration.
    ///
    /// A hand-built `Config` gets the same validation as one loaded from disk.
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let extractor = extractor_for_version(config.extractor.version).ok_or_else(|| {
            ConfigError::ValidationError(format!(
                "unknown extractor version {}",
                config.extractor.version
            ))
        })?;
        Self::with_extractor(config, Arc::from(extractor))
    }

    /// Assemble the pipeline with a caller-supplied feature extractor.
    pub fn with_extractor(
        config: &Config,
        extractor: Arc<dyn FeatureExtractor>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        tracing::debug!(
            "Pipeline services: vector={} commitment={} (extractor v{})",
            config.services.vector,
            config.services.commitment,
            extractor.version()
        );
        Ok(Self {
            services: config.services.clone(),
            validator: Validator::new(config.session.clone()),
            decoder: ImageDecoder::new(config.limits.clone()),
            extractor,
        })
    }

    /// Enabled sub-pipelines.
    pub fn services(&self) -> &ServicesConfig {
        &self.services
    }

    /// Active feature extractor.
    pub fn extractor(&self) -> &dyn FeatureExtractor {
        self.extractor.as_ref()
    }

    /// Run every enabled sub-pipeline for a submission.
    ///
    /// The first failure in stage order aborts the submission and is returned
    /// unchanged. No retries are attempted.
    pub async fn process(&self, submission: Submission) -> PipelineResult<PipelineOutput> {
        let start = Instant::now();
        tracing::debug!(
            "Processing submission device={} user={} ({} bytes)",
            submission.device_id,
            submission.user_id,
            submission.image.len()
        );

        let format = self.admit(&submission)?;
        let submission = Arc::new(submission);

        let vector_path = async {
            if self.services.vector {
                Some(self.run_vector(Arc::clone(&submission), format).await)
            } else {
                None
            }
        };
        let commit_path = async {
            if self.services.commitment {
                Some(self.run_commit(Arc::clone(&submission)).await)
            } else {
                None
            }
        };
        let (vector, transaction) = tokio::join!(vector_path, commit_path);

        let output = PipelineOutput {
            vector: vector.transpose()?,
            transaction: transaction.transpose()?,
        };
        tracing::debug!("Processed submission in {:?}", start.elapsed());
        Ok(output)
    }

    /// Run only the vector path.
    pub async fn convert_to_vector(
        &self,
        submission: Submission,
    ) -> PipelineResult<ImageToVectorResult> {
        if !self.services.vector {
            return Err(PipelineError::ServiceDisabled { service: "vector" });
        }
        let format = self.admit(&submission)?;
        self.run_vector(Arc::new(submission), format).await
    }

    /// Run only the commitment path.
    pub async fn commit(&self, submission: Submission) -> PipelineResult<TransactionRecord> {
        if !self.services.commitment {
            return Err(PipelineError::ServiceDisabled {
                service: "commitment",
            });
        }
        self.admit(&submission)?;
        self.run_commit(Arc::new(submission)).await
    }

    /// Validation followed by the codec's admission checks.
    fn admit(&self, submission: &Submission) -> PipelineResult<SupportedFormat> {
        let start = Instant::now();
        self.validator.validate(submission)?;
        let format = self.decoder.admit(&submission.image)?;
        tracing::trace!("  Validate + admit: {:?}", start.elapsed());
        Ok(format)
    }

    async fn run_vector(
        &self,
        submission: Arc<Submission>,
        format: SupportedFormat,
    ) -> PipelineResult<ImageToVectorResult> {
        let decoder = self.decoder.clone();
        let extractor = Arc::clone(&self.extractor);

        tokio::task::spawn_blocking(move || -> PipelineResult<ImageToVectorResult> {
            let decode_start = Instant::now();
            let decoded = decoder
                .decode_admitted(&submission.image.data, format)?
                .cropped(&submission.settings.preprocessing_options.crop);
            tracing::trace!("  Decode: {:?}", decode_start.elapsed());

            let extract_start = Instant::now();
            let vector = extractor.extract(&decoded);
            tracing::trace!("  Extract: {:?}", extract_start.elapsed());

            Ok(ImageToVectorResult::success(
                vector,
                decoded.width,
                decoded.height,
            ))
        })
        .await
        .map_err(|e| PipelineError::Worker {
            stage: "extract",
            message: e.to_string(),
        })?
    }

    async fn run_commit(&self, submission: Arc<Submission>) -> PipelineResult<TransactionRecord> {
        tokio::task::spawn_blocking(move || {
            let start = Instant::now();
            let record = CommitmentBuilder::record(&submission, Utc::now());
            tracing::trace!("  Commit: {:?}", start.elapsed());
            record
        })
        .await
        .map_err(|e| PipelineError::Worker {
            stage: "commit",
            message: e.to_string(),
        })
    }
}
