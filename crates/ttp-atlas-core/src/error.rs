//! Error types for ttp-atlas-core.
//!
//! This module defines the central error type [`CoreError`] used throughout
//! the atlas crates, along with the [`CoreResult<T>`] type alias and the
//! embedding-specific [`RejectionError`].
//!
//! # Examples
//!
//! ```rust
//! use ttp_atlas_core::{CoreError, RejectionError};
//!
//! let error = CoreError::Rejection(RejectionError::DimensionMismatch {
//!     expected: 1024,
//!     actual: 768,
//! });
//! assert!(error.to_string().contains("1024"));
//! ```

use thiserror::Error;
use uuid::Uuid;

use crate::types::{Modality, TaxonomyVersion, TechniqueId};

/// An embedding failed schema validation in the ingest adapter.
///
/// Every variant names the specific constraint that was violated, so
/// upstream producers can be told exactly what to fix. Rejected embeddings
/// are never coerced, truncated, or silently dropped.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RejectionError {
    /// No dimension schema is registered for this (modality, model, version).
    #[error("No embedding schema registered for ({modality}, {model_id}, {model_version})")]
    UnknownModelSchema {
        /// Modality tag of the rejected embedding.
        modality: Modality,
        /// Producing model identifier.
        model_id: String,
        /// Producing model version.
        model_version: String,
    },

    /// Vector length does not match the registered schema dimension.
    ///
    /// `Constraint: vector.len() == registered dimension`
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension declared for the (modality, model, version) schema.
        expected: usize,
        /// Actual vector length provided.
        actual: usize,
    },

    /// Vector contains NaN or an infinity.
    #[error("Embedding component at index {index} is not finite")]
    NonFiniteComponent {
        /// Index of the first offending component.
        index: usize,
    },

    /// Vector is empty.
    #[error("Embedding vector is empty")]
    EmptyVector,
}

/// Top-level error type for atlas core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An input failed validation and was rejected without partial effect.
    ///
    /// # When This Occurs
    ///
    /// - Publishing a taxonomy with duplicate or dangling references
    /// - A malformed technique identifier
    /// - Feedback referencing an assignment revision that does not exist
    #[error("Validation error: {field} - {message}")]
    Validation {
        /// Name of the field or input that failed validation.
        field: String,
        /// Description of the validation failure.
        message: String,
    },

    /// An embedding failed ingest schema checks.
    #[error(transparent)]
    Rejection(#[from] RejectionError),

    /// A technique reference could not be resolved in a taxonomy version.
    ///
    /// The ontology mapper degrades this to drop-and-warn; it is fatal only
    /// to direct `resolve` callers.
    #[error("Technique {id} not found in taxonomy version {version}")]
    TechniqueNotFound {
        /// The unresolvable technique identifier.
        id: TechniqueId,
        /// The taxonomy version that was consulted.
        version: TaxonomyVersion,
    },

    /// An assignment commit would violate monotonic revision ordering.
    ///
    /// Fatal to that call only; the caller retries with fresh state.
    #[error(
        "Revision conflict for document {document_id}: expected revision {expected}, got {actual}"
    )]
    RevisionConflict {
        /// Document whose history was being appended to.
        document_id: Uuid,
        /// The next revision number the store expected.
        expected: u32,
        /// The revision number the commit carried.
        actual: u32,
    },

    /// Configuration is invalid or could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An error occurred during storage operations.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<config::ConfigError> for CoreError {
    fn from(err: config::ConfigError) -> Self {
        CoreError::Config(err.to_string())
    }
}

/// Result type alias for atlas core operations.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_display_names_constraint() {
        let err = RejectionError::DimensionMismatch {
            expected: 1024,
            actual: 512,
        };
        let msg = err.to_string();
        assert!(msg.contains("expected 1024"));
        assert!(msg.contains("got 512"));
    }

    #[test]
    fn test_rejection_converts_into_core_error() {
        let core: CoreError = RejectionError::EmptyVector.into();
        assert!(matches!(
            core,
            CoreError::Rejection(RejectionError::EmptyVector)
        ));
    }

    #[test]
    fn test_revision_conflict_names_document() {
        let id = Uuid::nil();
        let err = CoreError::RevisionConflict {
            document_id: id,
            expected: 3,
            actual: 2,
        };
        assert!(err.to_string().contains(&id.to_string()));
    }
}
