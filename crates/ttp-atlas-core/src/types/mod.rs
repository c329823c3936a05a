//! Core domain types for the TTP Atlas classification pipeline.
//!
//! Type ownership follows the component boundaries:
//! - `technique` / `taxonomy`: owned by the taxonomy store
//! - `embedding`: produced by the ingest adapter
//! - `candidate`: produced by the classifier engine
//! - `assignment`: produced by the ontology mapper
//! - `feedback`: produced by the feedback ledger

mod assignment;
mod candidate;
mod embedding;
mod feedback;
mod taxonomy;
mod technique;

pub use assignment::{Assignment, CommittedTechnique, DocumentState};
pub use candidate::{sort_ranked, ClassificationCandidate, ScoringMethod};
pub use embedding::{EmbeddingProvenance, EmbeddingRecord, Modality, RawEmbedding};
pub use feedback::{FeedbackEvent, FeedbackVerdict};
pub use taxonomy::{validate_technique_set, TaxonomySnapshot, TaxonomyVersion};
pub use technique::{Tactic, Technique, TechniqueId};
