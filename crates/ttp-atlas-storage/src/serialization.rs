//! Binary serialization utilities.
//!
//! Records serialize with bincode (all three record types are fixed-layout
//! serde structs). Composite keys are hand-encoded so that RocksDB's
//! lexicographic key order matches the logical order:
//!
//! - assignments: `[document uuid (16)][revision u32 BE (4)]`
//! - feedback: `[document uuid (16)][millis sign-flipped i64 BE (8)][seq u64 BE (8)]`
//! - taxonomy versions: `[version u32 BE (4)]`
//!
//! Timestamps are sign-flipped before big-endian encoding so pre-epoch
//! values still sort below post-epoch ones.

use chrono::{DateTime, TimeZone, Utc};
use thiserror::Error;
use uuid::Uuid;

use ttp_atlas_core::types::{Assignment, FeedbackEvent, TaxonomySnapshot};

/// Errors that can occur during serialization/deserialization operations.
///
/// bincode's error type is not `Clone`, so messages are carried as
/// strings.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SerializationError {
    /// Serialization operation failed.
    #[error("Serialization failed: {0}")]
    SerializeFailed(String),

    /// Deserialization operation failed.
    #[error("Deserialization failed: {0}")]
    DeserializeFailed(String),

    /// A stored key has an unexpected length.
    #[error("Invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },
}

// ============================================================================
// Record serialization
// ============================================================================

/// Serialize a taxonomy snapshot for storage.
pub fn serialize_taxonomy(snapshot: &TaxonomySnapshot) -> Result<Vec<u8>, SerializationError> {
    bincode::serialize(snapshot).map_err(|e| SerializationError::SerializeFailed(e.to_string()))
}

/// Deserialize a stored taxonomy snapshot.
pub fn deserialize_taxonomy(bytes: &[u8]) -> Result<TaxonomySnapshot, SerializationError> {
    bincode::deserialize(bytes).map_err(|e| SerializationError::DeserializeFailed(e.to_string()))
}

/// Serialize an assignment revision for storage.
pub fn serialize_assignment(assignment: &Assignment) -> Result<Vec<u8>, SerializationError> {
    bincode::serialize(assignment).map_err(|e| SerializationError::SerializeFailed(e.to_string()))
}

/// Deserialize a stored assignment revision.
pub fn deserialize_assignment(bytes: &[u8]) -> Result<Assignment, SerializationError> {
    bincode::deserialize(bytes).map_err(|e| SerializationError::DeserializeFailed(e.to_string()))
}

/// Serialize a feedback event for storage.
pub fn serialize_feedback(event: &FeedbackEvent) -> Result<Vec<u8>, SerializationError> {
    bincode::serialize(event).map_err(|e| SerializationError::SerializeFailed(e.to_string()))
}

/// Deserialize a stored feedback event.
pub fn deserialize_feedback(bytes: &[u8]) -> Result<FeedbackEvent, SerializationError> {
    bincode::deserialize(bytes).map_err(|e| SerializationError::DeserializeFailed(e.to_string()))
}

// ============================================================================
// Key encoding
// ============================================================================

/// Taxonomy version key: u32 big-endian.
#[must_use]
pub fn encode_version_key(version: u32) -> [u8; 4] {
    version.to_be_bytes()
}

/// Assignment key: document uuid + revision, big-endian.
#[must_use]
pub fn encode_assignment_key(document_id: Uuid, revision: u32) -> [u8; 20] {
    let mut key = [0u8; 20];
    key[..16].copy_from_slice(document_id.as_bytes());
    key[16..].copy_from_slice(&revision.to_be_bytes());
    key
}

/// Revision number from an assignment key.
pub fn decode_assignment_revision(key: &[u8]) -> Result<u32, SerializationError> {
    if key.len() != 20 {
        return Err(SerializationError::InvalidKeyLength {
            expected: 20,
            actual: key.len(),
        });
    }
    let mut revision = [0u8; 4];
    revision.copy_from_slice(&key[16..]);
    Ok(u32::from_be_bytes(revision))
}

/// Feedback key: document uuid + sign-flipped millis + sequence.
#[must_use]
pub fn encode_feedback_key(document_id: Uuid, recorded_at: DateTime<Utc>, seq: u64) -> [u8; 32] {
    let mut key = [0u8; 32];
    key[..16].copy_from_slice(document_id.as_bytes());
    let millis = (recorded_at.timestamp_millis() as u64) ^ (1 << 63);
    key[16..24].copy_from_slice(&millis.to_be_bytes());
    key[24..].copy_from_slice(&seq.to_be_bytes());
    key
}

/// Timestamp from a feedback key.
pub fn decode_feedback_timestamp(key: &[u8]) -> Result<DateTime<Utc>, SerializationError> {
    if key.len() != 32 {
        return Err(SerializationError::InvalidKeyLength {
            expected: 32,
            actual: key.len(),
        });
    }
    let mut millis = [0u8; 8];
    millis.copy_from_slice(&key[16..24]);
    let raw = (u64::from_be_bytes(millis) ^ (1 << 63)) as i64;
    Utc.timestamp_millis_opt(raw)
        .single()
        .ok_or(SerializationError::DeserializeFailed(
            "feedback key timestamp out of range".to_string(),
        ))
}
