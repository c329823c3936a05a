//! Embedding record types shared by the ingest adapter and classifier.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Content modality of an embedding.
///
/// The explicit discriminant is what lets one classifier serve all four
/// content kinds: centroids and description embeddings are keyed per
/// modality, never mixed across modalities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    /// Article prose.
    Text,
    /// Figures and screenshots.
    Image,
    /// Code listings and scripts.
    Code,
    /// Structured tables (IOC lists, configuration dumps).
    Table,
}

impl Modality {
    /// All known modalities.
    pub const ALL: [Modality; 4] = [
        Modality::Text,
        Modality::Image,
        Modality::Code,
        Modality::Table,
    ];

    /// Lowercase tag for this modality.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Modality::Text => "text",
            Modality::Image => "image",
            Modality::Code => "code",
            Modality::Table => "table",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An embedding as produced upstream, before schema validation.
///
/// This is the wire shape handed over by the embedding models. Nothing
/// about it is trusted until [`EmbeddingIngestAdapter::normalize`] has
/// checked it against the registered schema.
///
/// [`EmbeddingIngestAdapter::normalize`]: crate::ingest::EmbeddingIngestAdapter::normalize
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEmbedding {
    /// Source document identifier.
    pub document_id: Uuid,
    /// Claimed modality tag.
    pub modality: Modality,
    /// The raw vector.
    pub vector: Vec<f32>,
    /// Producing model identifier (e.g. `"clip-vit-large"`).
    pub model_id: String,
    /// Producing model version (e.g. `"2024.1"`).
    pub model_version: String,
}

/// A schema-validated embedding.
///
/// Only the ingest adapter constructs these; holding one is proof that the
/// vector matched the dimension registered for its (modality, model,
/// version) and contains only finite components.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    /// Source document identifier.
    pub document_id: Uuid,
    /// Validated modality tag.
    pub modality: Modality,
    /// The validated vector.
    pub vector: Vec<f32>,
    /// Checked dimensionality (`vector.len()`).
    pub dimension: usize,
    /// Producing model identifier.
    pub model_id: String,
    /// Producing model version.
    pub model_version: String,
}

impl EmbeddingRecord {
    /// Provenance stamp naming the producer of this record.
    #[must_use]
    pub fn provenance(&self) -> EmbeddingProvenance {
        EmbeddingProvenance {
            modality: self.modality,
            model_id: self.model_id.clone(),
            model_version: self.model_version.clone(),
        }
    }
}

/// Names which embedding producer contributed to a committed assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingProvenance {
    /// Modality of the contributing record.
    pub modality: Modality,
    /// Producing model identifier.
    pub model_id: String,
    /// Producing model version.
    pub model_version: String,
}

impl fmt::Display for EmbeddingProvenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.modality, self.model_id, self.model_version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modality_tags_are_lowercase() {
        for m in Modality::ALL {
            assert_eq!(m.as_str(), m.as_str().to_lowercase());
        }
        let json = serde_json::to_string(&Modality::Table).unwrap();
        assert_eq!(json, "\"table\"");
    }

    #[test]
    fn test_provenance_display() {
        let record = EmbeddingRecord {
            document_id: Uuid::new_v4(),
            modality: Modality::Code,
            vector: vec![0.1, 0.2],
            dimension: 2,
            model_id: "codebert".to_string(),
            model_version: "1.0".to_string(),
        };
        assert_eq!(record.provenance().to_string(), "code/codebert@1.0");
    }
}
