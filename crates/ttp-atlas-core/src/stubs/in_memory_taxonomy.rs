//! In-memory taxonomy store.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tracing::info;

use crate::error::{CoreError, CoreResult};
use crate::traits::TaxonomyStore;
use crate::types::{
    validate_technique_set, TaxonomySnapshot, TaxonomyVersion, Technique, TechniqueId,
};

/// In-memory implementation of [`TaxonomyStore`].
///
/// Published snapshots live in a `DashMap` keyed by version number.
/// Publishing is serialized by a mutex so version assignment and
/// cross-version reference validation are atomic; reads never block on a
/// publish in progress.
#[derive(Debug, Default)]
pub struct InMemoryTaxonomyStore {
    versions: DashMap<u32, TaxonomySnapshot>,
    latest: AtomicU32,
    publish_lock: Mutex<()>,
}

impl InMemoryTaxonomyStore {
    /// Create an empty store with no published version.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn resolves_in_earlier_version(&self, id: &TechniqueId, up_to: u32) -> bool {
        (1..=up_to).any(|v| {
            self.versions
                .get(&v)
                .is_some_and(|snapshot| snapshot.contains(id))
        })
    }
}

#[async_trait]
impl TaxonomyStore for InMemoryTaxonomyStore {
    async fn publish(&self, techniques: Vec<Technique>) -> CoreResult<TaxonomyVersion> {
        let _guard = self
            .publish_lock
            .lock()
            .map_err(|_| CoreError::Storage("taxonomy publish lock poisoned".into()))?;

        let current = self.latest.load(Ordering::Acquire);

        let set = validate_technique_set(techniques, |successor| {
            self.resolves_in_earlier_version(successor, current)
        })?;

        let version = TaxonomyVersion(current + 1);
        let snapshot = TaxonomySnapshot {
            version,
            published_at: Utc::now(),
            techniques: set,
        };
        info!(
            version = version.0,
            techniques = snapshot.len(),
            "published taxonomy version"
        );
        self.versions.insert(version.0, snapshot);
        self.latest.store(version.0, Ordering::Release);
        Ok(version)
    }

    async fn resolve(&self, id: &TechniqueId, as_of: TaxonomyVersion) -> CoreResult<Technique> {
        self.versions
            .get(&as_of.0)
            .and_then(|snapshot| snapshot.get(id).cloned())
            .ok_or_else(|| CoreError::TechniqueNotFound {
                id: id.clone(),
                version: as_of,
            })
    }

    async fn latest(&self) -> CoreResult<Option<TaxonomyVersion>> {
        match self.latest.load(Ordering::Acquire) {
            0 => Ok(None),
            v => Ok(Some(TaxonomyVersion(v))),
        }
    }

    async fn snapshot(&self, version: TaxonomyVersion) -> CoreResult<TaxonomySnapshot> {
        self.versions
            .get(&version.0)
            .map(|s| s.value().clone())
            .ok_or_else(|| CoreError::Validation {
                field: "version".to_string(),
                message: format!("taxonomy version {version} was never published"),
            })
    }
}
