//! Sub-configuration structures for TTP Atlas components.
//!
//! This module contains the individual configuration structs that make up
//! the main `Config` structure.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::CoreResult;
use crate::ingest::EmbeddingSchemaRegistry;
use crate::types::Modality;

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Tracing filter directive (e.g. "info", "ttp_atlas_core=debug").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON-formatted log lines instead of human-readable ones.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// One declared embedding schema, loadable from configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchemaEntry {
    pub modality: Modality,
    pub model_id: String,
    pub model_version: String,
    pub dimension: usize,
}

/// Embedding ingest configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IngestConfig {
    /// Upper bound on any registered dimension (default: 16384).
    #[serde(default = "default_max_dimension")]
    pub max_dimension: usize,

    /// Embedding schemas to register at startup.
    #[serde(default)]
    pub schemas: Vec<SchemaEntry>,
}

impl IngestConfig {
    /// Build the schema registry declared by this configuration.
    ///
    /// # Errors
    ///
    /// Validation errors on duplicate entries, zero dimensions, or a
    /// dimension above `max_dimension`.
    pub fn build_registry(&self) -> CoreResult<EmbeddingSchemaRegistry> {
        let mut registry = EmbeddingSchemaRegistry::new();
        for entry in &self.schemas {
            if entry.dimension > self.max_dimension {
                return Err(crate::error::CoreError::Config(format!(
                    "schema ({}, {}, {}) dimension {} exceeds ingest.max_dimension {}",
                    entry.modality,
                    entry.model_id,
                    entry.model_version,
                    entry.dimension,
                    self.max_dimension
                )));
            }
            registry.register(
                entry.modality,
                entry.model_id.clone(),
                entry.model_version.clone(),
                entry.dimension,
            )?;
        }
        Ok(registry)
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_dimension: default_max_dimension(),
            schemas: Vec::new(),
        }
    }
}

fn default_max_dimension() -> usize {
    16384
}

/// Classifier engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClassifierConfig {
    /// Confirmed feedback events required before a technique's centroid
    /// participates in supervised scoring (default: 5).
    #[serde(default = "default_supervised_min_confirmations")]
    pub supervised_min_confirmations: usize,

    /// Candidates kept after ranking (default: 10).
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Weight applied to the supervised score in the weighted-max
    /// combination (default: 1.0 - supervised takes priority once
    /// eligible).
    #[serde(default = "default_supervised_weight")]
    pub supervised_weight: f32,

    /// New feedback events that trigger a recalibration (default: 50).
    #[serde(default = "default_recalibration_event_threshold")]
    pub recalibration_event_threshold: usize,

    /// Feedback outcomes required before a fitted calibration map replaces
    /// the identity map (default: 20).
    #[serde(default = "default_calibration_min_events")]
    pub calibration_min_events: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            supervised_min_confirmations: default_supervised_min_confirmations(),
            top_n: default_top_n(),
            supervised_weight: default_supervised_weight(),
            recalibration_event_threshold: default_recalibration_event_threshold(),
            calibration_min_events: default_calibration_min_events(),
        }
    }
}

fn default_supervised_min_confirmations() -> usize {
    5
}

fn default_top_n() -> usize {
    10
}

fn default_supervised_weight() -> f32 {
    1.0
}

fn default_recalibration_event_threshold() -> usize {
    50
}

fn default_calibration_min_events() -> usize {
    20
}

/// Ontology mapper configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MapperConfig {
    /// Minimum confidence for a candidate to be committed (default: 0.6).
    #[serde(default = "default_acceptance_threshold")]
    pub acceptance_threshold: f32,

    /// Confidence window below the top accepted candidate within which
    /// further accepted candidates are co-committed (default: 0.05).
    #[serde(default = "default_tie_band")]
    pub tie_band: f32,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            acceptance_threshold: default_acceptance_threshold(),
            tie_band: default_tie_band(),
        }
    }
}

fn default_acceptance_threshold() -> f32 {
    0.6
}

fn default_tie_band() -> f32 {
    0.05
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Database directory.
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,

    /// Shared block cache size in megabytes (default: 256).
    #[serde(default = "default_cache_size_mb")]
    pub cache_size_mb: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
            cache_size_mb: default_cache_size_mb(),
        }
    }
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("data/ttp-atlas")
}

fn default_cache_size_mb() -> usize {
    256
}
