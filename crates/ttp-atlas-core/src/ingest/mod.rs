//! Embedding ingest adapter.
//!
//! Normalizes embeddings of differing modality and dimensionality into the
//! common [`EmbeddingRecord`] shape. Pure validation and transform: no side
//! effects, no coercion. An embedding either matches the dimension
//! registered for its (modality, model, version) exactly, or it is rejected
//! with the specific constraint named.

mod registry;


pub use registry::{EmbeddingSchemaRegistry, SchemaKey};

use crate::error::{CoreResult, RejectionError};
use crate::types::{EmbeddingRecord, RawEmbedding};

/// Validates raw embeddings against the registered schemas.
///
/// # Example
///
/// ```
/// use ttp_atlas_core::{EmbeddingIngestAdapter, EmbeddingSchemaRegistry};
/// use ttp_atlas_core::types::{Modality, RawEmbedding};
/// use uuid::Uuid;
///
/// let mut registry = EmbeddingSchemaRegistry::new();
/// registry.register(Modality::Text, "minilm", "1.0", 4).unwrap();
/// let adapter = EmbeddingIngestAdapter::new(registry);
///
/// let raw = RawEmbedding {
///     document_id: Uuid::new_v4(),
///     modality: Modality::Text,
///     vector: vec![0.1, 0.2, 0.3, 0.4],
///     model_id: "minilm".to_string(),
///     model_version: "1.0".to_string(),
/// };
/// let record = adapter.normalize(raw).unwrap();
/// assert_eq!(record.dimension, 4);
/// ```
#[derive(Debug, Clone)]
pub struct EmbeddingIngestAdapter {
    registry: EmbeddingSchemaRegistry,
}

impl EmbeddingIngestAdapter {
    /// Create an adapter over a populated schema registry.
    #[must_use]
    pub fn new(registry: EmbeddingSchemaRegistry) -> Self {
        Self { registry }
    }

    /// The registry this adapter validates against.
    #[must_use]
    pub fn registry(&self) -> &EmbeddingSchemaRegistry {
        &self.registry
    }

    /// Validate a raw embedding into an [`EmbeddingRecord`].
    ///
    /// Checks, in order:
    /// 1. the vector is non-empty;
    /// 2. a schema is registered for (modality, model, version);
    /// 3. the vector length equals the registered dimension exactly;
    /// 4. every component is finite.
    ///
    /// # Errors
    ///
    /// [`RejectionError`] (wrapped in [`CoreError::Rejection`]) naming the
    /// violated constraint. Mismatched vectors are never coerced or
    /// truncated.
    ///
    /// [`CoreError::Rejection`]: crate::error::CoreError::Rejection
    pub fn normalize(&self, raw: RawEmbedding) -> CoreResult<EmbeddingRecord> {
        if raw.vector.is_empty() {
            return Err(RejectionError::EmptyVector.into());
        }

        let expected = self
            .registry
            .dimension_for(raw.modality, &raw.model_id, &raw.model_version)
            .ok_or_else(|| RejectionError::UnknownModelSchema {
                modality: raw.modality,
                model_id: raw.model_id.clone(),
                model_version: raw.model_version.clone(),
            })?;

        if raw.vector.len() != expected {
            return Err(RejectionError::DimensionMismatch {
                expected,
                actual: raw.vector.len(),
            }
            .into());
        }

        if let Some(index) = raw.vector.iter().position(|x| !x.is_finite()) {
            return Err(RejectionError::NonFiniteComponent { index }.into());
        }

        let dimension = raw.vector.len();
        Ok(EmbeddingRecord {
            document_id: raw.document_id,
            modality: raw.modality,
            vector: raw.vector,
            dimension,
            model_id: raw.model_id,
            model_version: raw.model_version,
        })
    }
}
