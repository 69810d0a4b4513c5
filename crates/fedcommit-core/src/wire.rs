//! JSON wire format for submissions and responses.
//!
//! Edge devices send a JSON request with the image base64-encoded under
//! `image.data`. [`SubmissionRequest`] mirrors that body exactly and converts
//! into a [`Submission`]; [`SubmissionResponse`] is what goes back.

use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ServicesConfig;
use crate::error::{PipelineResult, WireError};
use crate::pipeline::PipelineOutput;
use crate::types::{
    CommitmentResult, DebugInfo, DeviceInfo, ImagePayload, ImageToVectorResult, Location,
    Settings, Submission, SubmissionMetadata,
};

/// A submission as received on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionRequest {
    pub device_id: String,
    pub user_id: String,
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_issued_at: Option<DateTime<Utc>>,
    pub image: WireImage,
    pub location: Location,
    pub device_info: DeviceInfo,
    pub settings: Settings,
    pub context: String,
    pub network_quality: String,
    pub debug: DebugInfo,
}

/// The image part of a wire request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WireImage {
    /// Base64-encoded image bytes
    pub data: String,

    /// Declared format: "jpeg", "png" or a MIME type
    pub format: String,

    /// Client-reported image metadata; informational only
    pub metadata: WireImageMetadata,
}

/// Client-reported image metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WireImageMetadata {
    #[serde(rename = "imgWidth")]
    pub width: u32,
    #[serde(rename = "imgHeight")]
    pub height: u32,
    #[serde(rename = "requestImgTimestamp")]
    pub timestamp: String,
    #[serde(rename = "imgColorSpace")]
    pub colorspace: String,
    #[serde(rename = "imgOrientation")]
    pub orientation: String,
}

impl SubmissionRequest {
    /// Parse a request from a JSON body.
    pub fn from_json(body: &str) -> Result<Self, WireError> {
        Ok(serde_json::from_str(body)?)
    }

    /// Decode the image payload and build the submission.
    pub fn into_submission(self) -> Result<Submission, WireError> {
        let data = base64::engine::general_purpose::STANDARD.decode(self.image.data.trim())?;
        let content_type = Some(self.image.format).filter(|f| !f.trim().is_empty());

        Ok(Submission {
            device_id: self.device_id,
            user_id: self.user_id,
            session_id: self.session_id,
            session_issued_at: self.session_issued_at,
            image: ImagePayload::new(data, content_type),
            context: self.context,
            settings: self.settings,
            metadata: SubmissionMetadata {
                location: self.location,
                device_info: self.device_info,
                network_quality: self.network_quality,
                debug: self.debug,
            },
        })
    }
}

/// Response body for one submission.
///
/// Each enabled service contributes its result; on failure every enabled
/// service carries the same error message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmissionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector: Option<ImageToVectorResult>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub commitment: Option<CommitmentResult>,
}

impl SubmissionResponse {
    /// Render a pipeline outcome for the enabled services.
    pub fn from_outcome(
        services: &ServicesConfig,
        user_id: &str,
        outcome: &PipelineResult<PipelineOutput>,
    ) -> Self {
        match outcome {
            Ok(output) => Self {
                vector: output.vector.clone(),
                commitment: output.transaction.as_ref().map(CommitmentResult::from),
            },
            Err(err) => Self::rejected(services, user_id, &err.to_string()),
        }
    }

    /// A response for a submission that never produced results.
    pub fn rejected(services: &ServicesConfig, user_id: &str, message: &str) -> Self {
        Self {
            vector: services.vector.then(|| ImageToVectorResult {
                error: message.to_string(),
                ..ImageToVectorResult::default()
            }),
            commitment: services.commitment.then(|| CommitmentResult {
                user_id: user_id.to_string(),
                hash_value: String::new(),
                error: message.to_string(),
            }),
        }
    }

    /// Whether every present result succeeded.
    pub fn is_ok(&self) -> bool {
        self.vector.as_ref().map_or(true, ImageToVectorResult::is_ok)
            && self.commitment.as_ref().map_or(true, CommitmentResult::is_ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PipelineError, ValidationError};

    const REQUEST: &str = r#"{
        "device_id": "cam-7",
        "user_id": "alice",
        "session_id": "sess-1",
        "session_issued_at": "2026-03-01T12:00:00Z",
        "image": {
            "data": "YWJj",
            "format": "jpeg",
            "metadata": {"imgWidth": 640, "imgHeight": 480, "imgColorSpace": "sRGB"}
        },
        "location": {"latitude": 25.03, "longitude": 121.56},
        "device_info": {"model": "Pi 5", "os": "linux", "battery_level": 0.8, "network": "wifi"},
        "settings": {
            "return_confidence": true,
            "max_predictions": 3,
            "preprocessing_options": {"crop": {"x": 1, "y": 2, "width": 3, "height": 4}}
        },
        "context": "round-12",
        "network_quality": "good",
        "debug": {"enable_logging": true, "log_level": "debug"}
    }"#;

    #[test]
    fn test_request_into_submission() {
        let request = SubmissionRequest::from_json(REQUEST).unwrap();
        assert_eq!(request.image.metadata.width, 640);

        let submission = request.into_submission().unwrap();
        assert_eq!(submission.device_id, "cam-7");
        assert_eq!(submission.image.data, b"abc");
        assert_eq!(submission.image.content_type.as_deref(), Some("jpeg"));
        assert_eq!(submission.context, "round-12");
        assert_eq!(submission.settings.max_predictions, 3);
        assert_eq!(submission.settings.preprocessing_options.crop.height, 4);
        assert_eq!(submission.metadata.device_info.model, "Pi 5");
        assert_eq!(
            submission.session_issued_at.unwrap().to_rfc3339(),
            "2026-03-01T12:00:00+00:00"
        );
    }

    #[test]
    fn test_missing_fields_default() {
        let submission = SubmissionRequest::from_json(r#"{"user_id": "bob"}"#)
            .unwrap()
            .into_submission()
            .unwrap();
        assert_eq!(submission.user_id, "bob");
        assert!(submission.device_id.is_empty());
        assert!(submission.image.is_empty());
        assert!(submission.image.content_type.is_none());
    }

    #[test]
    fn test_invalid_base64() {
        let request = SubmissionRequest {
            image: WireImage {
                data: "not base64!".into(),
                ..WireImage::default()
            },
            ..SubmissionRequest::default()
        };
        assert!(matches!(
            request.into_submission(),
            Err(WireError::Base64(_))
        ));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            SubmissionRequest::from_json("{"),
            Err(WireError::Json(_))
        ));
    }

    #[test]
    fn test_failure_response_fills_enabled_services() {
        let outcome: PipelineResult<PipelineOutput> =
            Err(PipelineError::Validation(ValidationError::EmptyImage));
        let services = ServicesConfig {
            vector: false,
            commitment: true,
        };
        let response = SubmissionResponse::from_outcome(&services, "alice", &outcome);

        assert!(response.vector.is_none());
        let commitment = response.commitment.as_ref().unwrap();
        assert_eq!(commitment.user_id, "alice");
        assert_eq!(commitment.error, "Image data cannot be empty");
        assert!(!response.is_ok());

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("vector").is_none());
        assert_eq!(json["commitment"]["userID"], "alice");
    }
}
