//! Taxonomy store trait.

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::{TaxonomySnapshot, TaxonomyVersion, Technique, TechniqueId};

/// Versioned, append-only store of the MITRE ATT&CK technique set.
///
/// Publishing is the only mutation, and it only ever adds a new version.
/// No deletion exists; retiring a technique is modeled as marking it
/// deprecated in a newly published version.
#[async_trait]
pub trait TaxonomyStore: Send + Sync {
    /// Publish a new taxonomy version from a full technique set.
    ///
    /// Validates referential integrity before anything is written: no
    /// duplicate identifiers within the set, every technique passes
    /// [`Technique::validate`], and every `superseded_by` reference
    /// resolves within this set or an earlier published version.
    ///
    /// # Errors
    ///
    /// [`CoreError::Validation`] on any violation; nothing is published
    /// partially.
    ///
    /// [`CoreError::Validation`]: crate::error::CoreError::Validation
    async fn publish(&self, techniques: Vec<Technique>) -> CoreResult<TaxonomyVersion>;

    /// Resolve a technique as it existed in `as_of`.
    ///
    /// A deprecated technique is returned with its deprecation flag and
    /// superseding reference intact; following the reference is the
    /// caller's decision.
    ///
    /// # Errors
    ///
    /// [`CoreError::TechniqueNotFound`] if the technique is absent from
    /// that version (even if it was added in a later one).
    ///
    /// [`CoreError::TechniqueNotFound`]: crate::error::CoreError::TechniqueNotFound
    async fn resolve(&self, id: &TechniqueId, as_of: TaxonomyVersion) -> CoreResult<Technique>;

    /// Latest published version, `None` if nothing was published yet.
    async fn latest(&self) -> CoreResult<Option<TaxonomyVersion>>;

    /// Full immutable snapshot of one published version.
    ///
    /// # Errors
    ///
    /// [`CoreError::Validation`] if the version was never published.
    ///
    /// [`CoreError::Validation`]: crate::error::CoreError::Validation
    async fn snapshot(&self, version: TaxonomyVersion) -> CoreResult<TaxonomySnapshot>;
}
