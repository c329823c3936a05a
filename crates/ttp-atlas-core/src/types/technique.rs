//! Technique and tactic types for the MITRE ATT&CK taxonomy.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, CoreResult};

/// Stable ATT&CK technique identifier.
///
/// Shape is `T` followed by four digits, with an optional three-digit
/// sub-technique suffix (`T1059`, `T1059.001`). Ordering is lexicographic,
/// which for this shape matches the numeric ordering used by ATT&CK itself
/// and gives the deterministic tie-break order for ranked candidates.
///
/// # Example
///
/// ```
/// use ttp_atlas_core::types::TechniqueId;
///
/// let id = TechniqueId::new("T1566.002").unwrap();
/// assert!(id.is_subtechnique());
/// assert_eq!(id.parent().unwrap().as_str(), "T1566");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TechniqueId(String);

impl TechniqueId {
    /// Parse and validate a technique identifier.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] if the identifier does not match
    /// the `Tdddd` / `Tdddd.ddd` shape.
    pub fn new(raw: impl Into<String>) -> CoreResult<Self> {
        let raw = raw.into();
        if Self::is_valid_shape(&raw) {
            Ok(Self(raw))
        } else {
            Err(CoreError::Validation {
                field: "technique_id".to_string(),
                message: format!("'{raw}' does not match Tdddd or Tdddd.ddd"),
            })
        }
    }

    fn is_valid_shape(raw: &str) -> bool {
        let bytes = raw.as_bytes();
        let base_ok = bytes.len() >= 5
            && bytes[0] == b'T'
            && bytes[1..5].iter().all(u8::is_ascii_digit);
        if !base_ok {
            return false;
        }
        match bytes.len() {
            5 => true,
            9 => bytes[5] == b'.' && bytes[6..9].iter().all(u8::is_ascii_digit),
            _ => false,
        }
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if this is a sub-technique (`T1059.001`).
    #[must_use]
    pub fn is_subtechnique(&self) -> bool {
        self.0.contains('.')
    }

    /// Parent technique of a sub-technique, `None` for base techniques.
    #[must_use]
    pub fn parent(&self) -> Option<TechniqueId> {
        self.0
            .split_once('.')
            .map(|(base, _)| TechniqueId(base.to_string()))
    }
}

impl fmt::Display for TechniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The 14 ATT&CK enterprise tactics.
///
/// Serialized with ATT&CK's kebab-case shortnames (`initial-access`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tactic {
    Reconnaissance,
    ResourceDevelopment,
    InitialAccess,
    Execution,
    Persistence,
    PrivilegeEscalation,
    DefenseEvasion,
    CredentialAccess,
    Discovery,
    LateralMovement,
    Collection,
    CommandAndControl,
    Exfiltration,
    Impact,
}

impl Tactic {
    /// All tactics in kill-chain order.
    pub const ALL: [Tactic; 14] = [
        Tactic::Reconnaissance,
        Tactic::ResourceDevelopment,
        Tactic::InitialAccess,
        Tactic::Execution,
        Tactic::Persistence,
        Tactic::PrivilegeEscalation,
        Tactic::DefenseEvasion,
        Tactic::CredentialAccess,
        Tactic::Discovery,
        Tactic::LateralMovement,
        Tactic::Collection,
        Tactic::CommandAndControl,
        Tactic::Exfiltration,
        Tactic::Impact,
    ];

    /// ATT&CK shortname for this tactic.
    #[must_use]
    pub const fn shortname(&self) -> &'static str {
        match self {
            Tactic::Reconnaissance => "reconnaissance",
            Tactic::ResourceDevelopment => "resource-development",
            Tactic::InitialAccess => "initial-access",
            Tactic::Execution => "execution",
            Tactic::Persistence => "persistence",
            Tactic::PrivilegeEscalation => "privilege-escalation",
            Tactic::DefenseEvasion => "defense-evasion",
            Tactic::CredentialAccess => "credential-access",
            Tactic::Discovery => "discovery",
            Tactic::LateralMovement => "lateral-movement",
            Tactic::Collection => "collection",
            Tactic::CommandAndControl => "command-and-control",
            Tactic::Exfiltration => "exfiltration",
            Tactic::Impact => "impact",
        }
    }
}

impl fmt::Display for Tactic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.shortname())
    }
}

/// A technique as published in one taxonomy version.
///
/// Immutable once published; retiring a technique is modeled as publishing
/// a new version with `deprecated: true` and (optionally) a superseding
/// reference. A `superseded_by` reference is only meaningful on a
/// deprecated technique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Technique {
    /// Stable identifier (`T1059`, `T1059.001`).
    pub id: TechniqueId,
    /// Human-readable name.
    pub name: String,
    /// Natural-language description; source text for zero-shot scoring.
    pub description: String,
    /// Tactics this technique belongs to. Non-empty.
    pub tactics: Vec<Tactic>,
    /// True if the technique is retired in this version.
    #[serde(default)]
    pub deprecated: bool,
    /// Successor technique, if this one was superseded rather than retired
    /// outright.
    ///
    /// Serialized unconditionally: storage records go through bincode,
    /// which cannot round-trip skipped fields.
    #[serde(default)]
    pub superseded_by: Option<TechniqueId>,
}

impl Technique {
    /// Validate structural invariants before publication.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] if the name or tactic set is
    /// empty, or a superseding reference is present on a non-deprecated
    /// technique.
    pub fn validate(&self) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::Validation {
                field: "name".to_string(),
                message: format!("technique {} has an empty name", self.id),
            });
        }
        if self.tactics.is_empty() {
            return Err(CoreError::Validation {
                field: "tactics".to_string(),
                message: format!("technique {} has no tactics", self.id),
            });
        }
        if self.superseded_by.is_some() && !self.deprecated {
            return Err(CoreError::Validation {
                field: "superseded_by".to_string(),
                message: format!(
                    "technique {} carries a superseding reference but is not deprecated",
                    self.id
                ),
            });
        }
        Ok(())
    }
}
