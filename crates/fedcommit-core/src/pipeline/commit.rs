//! Commitment hashing for ledger submission.
//!
//! The canonical preimage is the UTF-8 device id, the UTF-8 user id, the raw
//! image bytes and the UTF-8 context, concatenated in that order with no
//! separators. Field order and the absence of separators are part of the
//! protocol: changing either invalidates every previously issued commitment.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::error::CommitmentMismatch;
use crate::types::{Commitment, Submission, TransactionRecord};

/// Builds and verifies SHA-256 commitments.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommitmentBuilder;

impl CommitmentBuilder {
    /// Compute the commitment for the given fields.
    pub fn build(device_id: &str, user_id: &str, image: &[u8], context: &str) -> Commitment {
        Commitment {
            user_id: user_id.to_string(),
            hash_value: Self::digest_hex(device_id, user_id, image, context),
        }
    }

    /// Lowercase hex SHA-256 of the canonical preimage.
    ///
    /// Equal to hashing the concatenated fields as one buffer.
    pub fn digest_hex(device_id: &str, user_id: &str, image: &[u8], context: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(device_id.as_bytes());
        hasher.update(user_id.as_bytes());
        hasher.update(image);
        hasher.update(context.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Build the transaction record for a validated submission.
    pub fn record(submission: &Submission, created_at: DateTime<Utc>) -> TransactionRecord {
        let commitment = Self::build(
            &submission.device_id,
            &submission.user_id,
            &submission.image.data,
            &submission.context,
        );
        TransactionRecord::new(
            commitment,
            submission.device_id.clone(),
            submission.session_id.clone(),
            created_at,
        )
    }

    /// Re-derive a commitment from original inputs and compare it to a claim.
    ///
    /// Comparison is case-insensitive on the hex digits.
    pub fn verify(
        device_id: &str,
        user_id: &str,
        image: &[u8],
        context: &str,
        expected_hex: &str,
    ) -> Result<(), CommitmentMismatch> {
        let actual = Self::digest_hex(device_id, user_id, image, context);
        if actual.eq_ignore_ascii_case(expected_hex.trim()) {
            Ok(())
        } else {
            Err(CommitmentMismatch {
                expected: expected_hex.to_string(),
                actual,
            })
        }
    }
}
