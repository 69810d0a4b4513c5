//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};

/// Which sub-pipelines are assembled at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    /// Produce feature vectors from submitted images
    pub vector: bool,

    /// Produce ledger commitments for submissions
    pub commitment: bool,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            vector: true,
            commitment: true,
        }
    }
}

/// Processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Maximum number of submissions in flight during batch runs
    pub parallel_workers: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            parallel_workers: 4,
        }
    }
}

/// Resource limits to protect against problematic payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum image payload size in bytes
    pub max_payload_bytes: u64,

    /// Maximum accepted image dimension (width or height)
    pub max_image_dimension: u32,
}

/// Default payload cap: 10 MiB.
pub const DEFAULT_MAX_PAYLOAD_BYTES: u64 = 10 << 20;

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            max_image_dimension: 16384,
        }
    }
}

/// Session expiry policy.
///
/// With `ttl_secs` unset no expiry is enforced and only a non-empty session
/// identifier is required.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Session lifetime in seconds, measured from `session_issued_at`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl_secs: Option<u64>,

    /// Tolerated clock skew for issue times slightly in the future
    pub max_clock_skew_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: None,
            max_clock_skew_secs: 60,
        }
    }
}

/// Feature extractor selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Extractor version: 1 = dimensions, 2 = dimensions + luma histogram
    pub version: u32,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self { version: 1 }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format ("json" or "jsonl")
    pub format: String,

    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "json".to_string(),
            pretty: false,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
