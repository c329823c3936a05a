//! Registered embedding schemas: (modality, model, version) -> dimension.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{CoreError, CoreResult};
use crate::types::Modality;

/// Key identifying one embedding producer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaKey {
    /// Content modality the producer embeds.
    pub modality: Modality,
    /// Producing model identifier.
    pub model_id: String,
    /// Producing model version.
    pub model_version: String,
}

/// Table of declared embedding dimensions.
///
/// One entry per (modality, model, version). Registration is explicit and
/// duplicate-free: a model version that changes its output dimension must
/// be registered as a new version, never re-registered in place.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbeddingSchemaRegistry {
    entries: HashMap<SchemaKey, usize>,
}

impl EmbeddingSchemaRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the dimension for a (modality, model, version) producer.
    ///
    /// # Errors
    ///
    /// [`CoreError::Validation`] on a zero dimension or a duplicate key.
    pub fn register(
        &mut self,
        modality: Modality,
        model_id: impl Into<String>,
        model_version: impl Into<String>,
        dimension: usize,
    ) -> CoreResult<()> {
        let key = SchemaKey {
            modality,
            model_id: model_id.into(),
            model_version: model_version.into(),
        };
        if dimension == 0 {
            return Err(CoreError::Validation {
                field: "dimension".to_string(),
                message: format!(
                    "schema ({}, {}, {}) declares dimension 0",
                    key.modality, key.model_id, key.model_version
                ),
            });
        }
        if self.entries.contains_key(&key) {
            return Err(CoreError::Validation {
                field: "schema".to_string(),
                message: format!(
                    "schema ({}, {}, {}) is already registered",
                    key.modality, key.model_id, key.model_version
                ),
            });
        }
        self.entries.insert(key, dimension);
        Ok(())
    }

    /// Declared dimension for a producer, if registered.
    #[must_use]
    pub fn dimension_for(
        &self,
        modality: Modality,
        model_id: &str,
        model_version: &str,
    ) -> Option<usize> {
        let key = SchemaKey {
            modality,
            model_id: model_id.to_string(),
            model_version: model_version.to_string(),
        };
        self.entries.get(&key).copied()
    }

    /// Number of registered schemas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no schema is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
