//! Configuration validation with range checks.

use crate::error::ConfigError;
use crate::pipeline::extract::supported_versions;

use super::Config;

/// Upper bound for session durations: one hundred years.
pub const MAX_SESSION_SECS: u64 = 100 * 365 * 24 * 60 * 60;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if !self.services.vector && !self.services.commitment {
            return Err(ConfigError::ValidationError(
                "at least one of services.vector or services.commitment must be enabled".into(),
            ));
        }
        if self.processing.parallel_workers == 0 {
            return Err(ConfigError::ValidationError(
                "processing.parallel_workers must be > 0".into(),
            ));
        }
        if self.limits.max_payload_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_payload_bytes must be > 0".into(),
            ));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        if self.session.ttl_secs == Some(0) {
            return Err(ConfigError::ValidationError(
                "session.ttl_secs must be > 0 when set".into(),
            ));
        }
        if self.session.ttl_secs.is_some_and(|ttl| ttl > MAX_SESSION_SECS) {
            return Err(ConfigError::ValidationError(format!(
                "session.ttl_secs must be <= {MAX_SESSION_SECS}"
            )));
        }
        if self.session.max_clock_skew_secs > MAX_SESSION_SECS {
            return Err(ConfigError::ValidationError(format!(
                "session.max_clock_skew_secs must be <= {MAX_SESSION_SECS}"
            )));
        }
        if !supported_versions().contains(&self.extractor.version) {
            return Err(ConfigError::ValidationError(format!(
                "extractor.version must be one of {:?}",
                supported_versions()
            )));
        }
        Ok(())
    }
}
