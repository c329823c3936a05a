//! Ranked classification candidates produced by the classifier engine.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use super::taxonomy::TaxonomyVersion;
use super::technique::TechniqueId;

/// Which scoring path produced a candidate's confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScoringMethod {
    /// Nearest-centroid score against confirmed technique clusters.
    Supervised,
    /// Similarity to the technique's description embedding.
    ZeroShot,
}

impl fmt::Display for ScoringMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoringMethod::Supervised => f.write_str("supervised"),
            ScoringMethod::ZeroShot => f.write_str("zero-shot"),
        }
    }
}

/// One ranked technique candidate for an embedding record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationCandidate {
    /// Candidate technique.
    pub technique_id: TechniqueId,
    /// Taxonomy version the candidate was evaluated against.
    pub taxonomy_version: TaxonomyVersion,
    /// Calibrated confidence in [0, 1].
    pub confidence: f32,
    /// Scoring path that won for this technique.
    pub method: ScoringMethod,
}

impl ClassificationCandidate {
    /// Ranking order: descending confidence, ties broken by ascending
    /// technique identifier.
    ///
    /// Uses `total_cmp` so the order is total even if a non-finite
    /// confidence ever slips through; validation upstream should prevent
    /// that, but sort order must never be allowed to panic.
    #[must_use]
    pub fn ranking_cmp(&self, other: &Self) -> Ordering {
        other
            .confidence
            .total_cmp(&self.confidence)
            .then_with(|| self.technique_id.cmp(&other.technique_id))
    }
}

/// Sort candidates into ranked order in place.
pub fn sort_ranked(candidates: &mut [ClassificationCandidate]) {
    candidates.sort_by(ClassificationCandidate::ranking_cmp);
}
