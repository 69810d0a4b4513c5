//! Core data types for the fedcommit ingestion pipeline.
//!
//! A [`Submission`] goes in; a [`FeatureVector`] and a [`TransactionRecord`]
//! come out. The outward-facing JSON shapes live in [`ImageToVectorResult`]
//! and [`CommitmentResult`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One client-originated request: identifiers, an image payload and context.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    /// Identifier of the submitting edge device
    pub device_id: String,

    /// Identifier of the user on whose behalf the device submits
    pub user_id: String,

    /// Session the submission belongs to
    pub session_id: String,

    /// When the session was issued, for expiry checks
    pub session_issued_at: Option<DateTime<Utc>>,

    /// Raw image payload
    pub image: ImagePayload,

    /// Free-form context string, committed verbatim
    pub context: String,

    /// Optional processing settings
    pub settings: Settings,

    /// Descriptive metadata; never part of the commitment
    pub metadata: SubmissionMetadata,
}

/// Raw image bytes plus the content type the client declared for them.
#[derive(Debug, Clone, Default)]
pub struct ImagePayload {
    /// Encoded image bytes (JPEG or PNG)
    pub data: Vec<u8>,

    /// Declared content type, e.g. "image/jpeg"
    pub content_type: Option<String>,
}

impl ImagePayload {
    pub fn new(data: Vec<u8>, content_type: Option<String>) -> Self {
        Self { data, content_type }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Per-submission settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Ask downstream inference to return confidence values
    pub return_confidence: bool,

    /// Cap on predictions requested from downstream inference
    pub max_predictions: u32,

    /// Image preprocessing applied before feature extraction
    pub preprocessing_options: PreprocessingOptions,
}

/// Preprocessing applied to the decoded image on the vector path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessingOptions {
    /// Region of interest; a zero width or height means no crop
    pub crop: CropOptions,

    /// Requested brightness normalization (carried, not applied)
    pub adjust_brightness: bool,
}

/// Crop rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropOptions {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropOptions {
    /// Whether this crop describes a non-empty region.
    pub fn is_set(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Descriptive metadata sent alongside a submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionMetadata {
    pub location: Location,
    pub device_info: DeviceInfo,
    pub network_quality: String,
    pub debug: DebugInfo,
}

/// Geographic position reported by the device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// Hardware and connectivity details of the device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceInfo {
    pub model: String,
    pub os: String,
    pub battery_level: f64,
    pub network: String,
}

/// Client-side debugging flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugInfo {
    pub enable_logging: bool,
    pub log_level: String,
}

/// Fixed-arity numeric summary of an image.
///
/// Values are always finite; the extractor version pins arity and meaning.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    version: u32,
    values: Vec<f64>,
}

impl FeatureVector {
    /// Build a vector, replacing any non-finite value with `0.0`.
    pub fn new(version: u32, values: Vec<f64>) -> Self {
        let values = values
            .into_iter()
            .map(|v| {
                if v.is_finite() {
                    v
                } else {
                    tracing::warn!("Non-finite feature value {v} replaced with 0.0");
                    0.0
                }
            })
            .collect();
        Self { version, values }
    }

    /// Extractor version that produced this vector.
    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }
}

/// Digest binding a submission's identity and content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Commitment {
    /// User the commitment was made for
    pub user_id: String,

    /// 64-character lowercase hex SHA-256 digest
    pub hash_value: String,
}

/// The externally returned artifact for the commitment path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRecord {
    commitment: Commitment,
    device_id: String,
    session_id: String,
    created_at: DateTime<Utc>,
}

impl TransactionRecord {
    pub(crate) fn new(
        commitment: Commitment,
        device_id: String,
        session_id: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            commitment,
            device_id,
            session_id,
            created_at,
        }
    }

    pub fn commitment(&self) -> &Commitment {
        &self.commitment
    }

    pub fn user_id(&self) -> &str {
        &self.commitment.user_id
    }

    pub fn hash_value(&self) -> &str {
        &self.commitment.hash_value
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// When the record was produced; not covered by the digest.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Vector-path output as returned to the calling layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageToVectorResult {
    pub vector: Vec<f64>,

    /// Extractor version that produced `vector`; 0 when there is none
    #[serde(default)]
    pub version: u32,

    /// Dimensions formatted as "WxH"
    #[serde(rename = "imageSize")]
    pub image_size: String,

    /// Empty on success
    pub error: String,
}

impl ImageToVectorResult {
    pub fn success(vector: FeatureVector, width: u32, height: u32) -> Self {
        Self {
            version: vector.version(),
            vector: vector.into_values(),
            image_size: format!("{width}x{height}"),
            error: String::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_empty()
    }
}

/// Commitment-path output as returned to the calling layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitmentResult {
    #[serde(rename = "userID")]
    pub user_id: String,

    #[serde(rename = "hashValue")]
    pub hash_value: String,

    /// Empty on success
    pub error: String,
}

impl CommitmentResult {
    pub fn is_ok(&self) -> bool {
        self.error.is_empty()
    }
}

impl From<&TransactionRecord> for CommitmentResult {
    fn from(record: &TransactionRecord) -> Self {
        Self {
            user_id: record.commitment().user_id.clone(),
            hash_value: record.commitment().hash_value.clone(),
            error: String::new(),
        }
    }
}
