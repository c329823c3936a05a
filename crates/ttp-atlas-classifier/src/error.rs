//! Error types for the classifier engine.

use thiserror::Error;

use ttp_atlas_core::CoreError;

/// Errors surfaced by the classifier engine.
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// The snapshot lock was poisoned by a panicking writer.
    #[error("Classifier snapshot lock poisoned")]
    Poisoned,

    /// Recalibration could not build a new snapshot.
    ///
    /// The previously active snapshot remains in service.
    #[error("Recalibration failed: {0}")]
    Recalibration(String),

    /// A core-store operation failed.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl From<ClassifierError> for CoreError {
    fn from(err: ClassifierError) -> Self {
        match err {
            ClassifierError::Core(core) => core,
            other => CoreError::Storage(other.to_string()),
        }
    }
}

/// Result type alias for classifier operations.
pub type ClassifierResult<T> = Result<T, ClassifierError>;
