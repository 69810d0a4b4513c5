//! Submission validation before any processing.

use chrono::{DateTime, Duration, Utc};

use crate::config::SessionConfig;
use crate::error::ValidationError;
use crate::types::Submission;

/// Validates submissions against structural rules and the session policy.
#[derive(Debug, Clone)]
pub struct Validator {
    session: SessionConfig,
}

impl Validator {
    /// Create a new validator with the given session policy.
    pub fn new(session: SessionConfig) -> Self {
        Self { session }
    }

    /// Validate a submission against the current time.
    pub fn validate(&self, submission: &Submission) -> Result<(), ValidationError> {
        self.validate_at(submission, Utc::now())
    }

    /// Validate a submission as of `now`.
    ///
    /// Checks run in a fixed order and the first failure wins:
    /// - device id, then user id, non-empty
    /// - image payload non-empty
    /// - session id non-empty and, under a TTL policy, not expired
    pub fn validate_at(
        &self,
        submission: &Submission,
        now: DateTime<Utc>,
    ) -> Result<(), ValidationError> {
        require_non_empty("device_id", &submission.device_id)?;
        require_non_empty("user_id", &submission.user_id)?;

        if submission.image.is_empty() {
            return Err(ValidationError::EmptyImage);
        }

        if submission.session_id.trim().is_empty() {
            return Err(ValidationError::InvalidSession {
                reason: "session_id cannot be empty".to_string(),
            });
        }

        self.check_expiry(submission.session_issued_at, now)
    }

    fn check_expiry(
        &self,
        issued_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<(), ValidationError> {
        let Some(ttl_secs) = self.session.ttl_secs else {
            return Ok(());
        };

        let Some(issued_at) = issued_at else {
            return Err(ValidationError::InvalidSession {
                reason: "session issue time is required when sessions expire".to_string(),
            });
        };

        // A window that overflows the representable range never closes.
        let skew = Duration::seconds(clamp_secs(self.session.max_clock_skew_secs));
        if let Some(latest) = now.checked_add_signed(skew) {
            if issued_at > latest {
                return Err(ValidationError::InvalidSession {
                    reason: format!("session issued in the future ({issued_at})"),
                });
            }
        }

        let ttl = Duration::seconds(clamp_secs(ttl_secs));
        if let Some(expires_at) = issued_at.checked_add_signed(ttl) {
            if now >= expires_at {
                return Err(ValidationError::InvalidSession {
                    reason: format!("session expired at {expires_at}"),
                });
            }
        }

        Ok(())
    }
}

fn require_non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    Ok(())
}

// chrono::Duration::seconds panics past i64::MAX / 1000.
fn clamp_secs(secs: u64) -> i64 {
    secs.min(i64::MAX as u64 / 1000) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ImagePayload;

    fn submission() -> Submission {
        Submission {
            device_id: "d1".into(),
            user_id: "u1".into(),
            session_id: "s1".into(),
            image: ImagePayload::new(vec![1, 2, 3], Some("image/png".into())),
            context: "ctx".into(),
            ..Submission::default()
        }
    }

    fn ttl_validator(ttl_secs: u64) -> Validator {
        Validator::new(SessionConfig {
            ttl_secs: Some(ttl_secs),
            max_clock_skew_secs: 60,
        })
    }

    #[test]
    fn test_valid_submission() {
        let validator = Validator::new(SessionConfig::default());
        assert!(validator.validate(&submission()).is_ok());
    }

    #[test]
    fn test_empty_device_id() {
        let validator = Validator::new(SessionConfig::default());
        let mut sub = submission();
        sub.device_id.clear();
        assert_eq!(
            validator.validate(&sub),
            Err(ValidationError::EmptyField { field: "device_id" })
        );
    }

    #[test]
    fn test_whitespace_user_id_is_empty() {
        let validator = Validator::new(SessionConfig::default());
        let mut sub = submission();
        sub.user_id = "   ".into();
        assert_eq!(
            validator.validate(&sub),
            Err(ValidationError::EmptyField { field: "user_id" })
        );
    }

    #[test]
    fn test_identifier_check_wins_over_image_check() {
        let validator = Validator::new(SessionConfig::default());
        let mut sub = submission();
        sub.user_id.clear();
        sub.image.data.clear();
        assert_eq!(
            validator.validate(&sub),
            Err(ValidationError::EmptyField { field: "user_id" })
        );
    }

    #[test]
    fn test_image_check_wins_over_session_check() {
        let validator = Validator::new(SessionConfig::default());
        let mut sub = submission();
        sub.image.data.clear();
        sub.session_id.clear();
        assert_eq!(validator.validate(&sub), Err(ValidationError::EmptyImage));
    }

    #[test]
    fn test_empty_session() {
        let validator = Validator::new(SessionConfig::default());
        let mut sub = submission();
        sub.session_id.clear();
        assert!(matches!(
            validator.validate(&sub),
            Err(ValidationError::InvalidSession { .. })
        ));
    }

    #[test]
    fn test_no_policy_ignores_issue_time() {
        let validator = Validator::new(SessionConfig::default());
        let mut sub = submission();
        sub.session_issued_at = Some(Utc::now() - Duration::days(365));
        assert!(validator.validate(&sub).is_ok());
    }

    #[test]
    fn test_fresh_session_under_policy() {
        let now = Utc::now();
        let mut sub = submission();
        sub.session_issued_at = Some(now - Duration::seconds(10));
        assert!(ttl_validator(60).validate_at(&sub, now).is_ok());
    }

    #[test]
    fn test_expired_session_under_policy() {
        let now = Utc::now();
        let mut sub = submission();
        sub.session_issued_at = Some(now - Duration::seconds(61));
        let err = ttl_validator(60).validate_at(&sub, now).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidSession { .. }));
        assert!(err.to_string().contains("expired"));
    }

    #[test]
    fn test_missing_issue_time_under_policy() {
        let err = ttl_validator(60)
            .validate_at(&submission(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidSession { .. }));
    }

    #[test]
    fn test_huge_ttl_never_expires() {
        let now = Utc::now();
        let mut sub = submission();
        sub.session_issued_at = Some(now - Duration::seconds(10));
        assert!(ttl_validator(10_000_000_000_000).validate_at(&sub, now).is_ok());
        assert!(ttl_validator(u64::MAX).validate_at(&sub, now).is_ok());
    }

    #[test]
    fn test_huge_skew_accepts_future_issue_time() {
        let now = Utc::now();
        let mut sub = submission();
        sub.session_issued_at = Some(now + Duration::days(30));
        let validator = Validator::new(SessionConfig {
            ttl_secs: Some(60),
            max_clock_skew_secs: u64::MAX,
        });
        assert!(validator.validate_at(&sub, now).is_ok());
    }

    #[test]
    fn test_future_issue_time_beyond_skew() {
        let now = Utc::now();
        let mut sub = submission();
        sub.session_issued_at = Some(now + Duration::seconds(120));
        let err = ttl_validator(600).validate_at(&sub, now).unwrap_err();
        assert!(err.to_string().contains("future"));

        sub.session_issued_at = Some(now + Duration::seconds(30));
        assert!(ttl_validator(600).validate_at(&sub, now).is_ok());
    }
}
