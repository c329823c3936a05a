//! Versioned taxonomy snapshot types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::technique::{Technique, TechniqueId};

/// Monotonically-numbered taxonomy version.
///
/// Versions are assigned by the taxonomy store starting at 1. A published
/// version is never mutated; it can only be superseded by a higher one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TaxonomyVersion(pub u32);

impl TaxonomyVersion {
    /// The first version a store ever publishes.
    pub const FIRST: TaxonomyVersion = TaxonomyVersion(1);

    /// The version that follows this one.
    #[must_use]
    pub const fn next(&self) -> TaxonomyVersion {
        TaxonomyVersion(self.0 + 1)
    }
}

impl fmt::Display for TaxonomyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// An immutable snapshot of the full technique set at one version.
///
/// Techniques are keyed in a `BTreeMap` so iteration order is the
/// deterministic ascending-identifier order used everywhere ranked output
/// needs a tie-break.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonomySnapshot {
    /// Version number of this snapshot.
    pub version: TaxonomyVersion,
    /// Publication timestamp.
    pub published_at: DateTime<Utc>,
    /// Full technique set as of this version.
    pub techniques: BTreeMap<TechniqueId, Technique>,
}

impl TaxonomySnapshot {
    /// Look up a technique in this snapshot.
    #[must_use]
    pub fn get(&self, id: &TechniqueId) -> Option<&Technique> {
        self.techniques.get(id)
    }

    /// True if the snapshot contains `id`.
    #[must_use]
    pub fn contains(&self, id: &TechniqueId) -> bool {
        self.techniques.contains_key(id)
    }

    /// Number of techniques in this snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.techniques.len()
    }

    /// True if the snapshot has no techniques.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.techniques.is_empty()
    }

    /// Iterate techniques in ascending identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &Technique> {
        self.techniques.values()
    }
}

/// Validate a technique set for publication and index it by identifier.
///
/// Enforces the publish-time invariants shared by every store backend: no
/// duplicate identifiers, every technique structurally valid, and every
/// superseding reference resolving within this set or an earlier published
/// version (as reported by `resolves_in_earlier_version`).
///
/// # Errors
///
/// [`CoreError::Validation`] on the first violation; the caller publishes
/// nothing.
///
/// [`CoreError::Validation`]: crate::error::CoreError::Validation
pub fn validate_technique_set(
    techniques: Vec<Technique>,
    mut resolves_in_earlier_version: impl FnMut(&TechniqueId) -> bool,
) -> crate::error::CoreResult<BTreeMap<TechniqueId, Technique>> {
    use crate::error::CoreError;

    let mut set: BTreeMap<TechniqueId, Technique> = BTreeMap::new();
    for technique in techniques {
        technique.validate()?;
        if set.contains_key(&technique.id) {
            return Err(CoreError::Validation {
                field: "techniques".to_string(),
                message: format!("duplicate technique identifier {}", technique.id),
            });
        }
        set.insert(technique.id.clone(), technique);
    }

    for technique in set.values() {
        if let Some(successor) = &technique.superseded_by {
            let resolves = set.contains_key(successor) || resolves_in_earlier_version(successor);
            if !resolves {
                return Err(CoreError::Validation {
                    field: "superseded_by".to_string(),
                    message: format!(
                        "technique {} references unknown successor {}",
                        technique.id, successor
                    ),
                });
            }
        }
    }

    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Tactic;

    #[test]
    fn test_version_ordering_and_next() {
        assert!(TaxonomyVersion(2) > TaxonomyVersion::FIRST);
        assert_eq!(TaxonomyVersion::FIRST.next(), TaxonomyVersion(2));
        assert_eq!(TaxonomyVersion(7).to_string(), "v7");
    }

    #[test]
    fn test_snapshot_iterates_in_identifier_order() {
        let mut techniques = BTreeMap::new();
        for raw in ["T1566", "T1059", "T1190"] {
            let id = TechniqueId::new(raw).unwrap();
            techniques.insert(
                id.clone(),
                Technique {
                    id,
                    name: raw.to_string(),
                    description: String::new(),
                    tactics: vec![Tactic::Execution],
                    deprecated: false,
                    superseded_by: None,
                },
            );
        }
        let snapshot = TaxonomySnapshot {
            version: TaxonomyVersion::FIRST,
            published_at: Utc::now(),
            techniques,
        };
        let order: Vec<&str> = snapshot.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(order, vec!["T1059", "T1190", "T1566"]);
    }
}
