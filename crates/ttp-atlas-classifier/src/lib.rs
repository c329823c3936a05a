//! TTP Atlas Classifier Engine
//!
//! Scores normalized embeddings against the technique taxonomy, combining
//! two paths per technique:
//!
//! - **supervised**: cosine similarity to the technique's confirmed-example
//!   centroid, eligible only once enough human confirmations exist;
//! - **zero-shot**: cosine similarity to the technique's description
//!   embedding, available for every technique.
//!
//! All scoring runs against an immutable [`ClassifierSnapshot`]. Feedback-
//! driven recalibration builds a complete new snapshot off to the side and
//! installs it with an atomic swap, so an in-flight `classify` call is
//! always internally consistent and a failed recalibration leaves the
//! previous snapshot serving.

pub mod calibration;
pub mod engine;
pub mod error;
pub mod snapshot;

mod supervised;
mod zeroshot;

pub use calibration::CalibrationMap;
pub use engine::{ClassifierEngine, LabeledExamples};
pub use error::{ClassifierError, ClassifierResult};
pub use snapshot::{ClassifierSnapshot, SnapshotBuilder, TechniqueCentroid};
