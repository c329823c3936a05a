//! Acceptance and tie-band policy.
//!
//! Policy in one line: commit the top candidate at or above the acceptance
//! threshold, plus every other at-or-above-threshold candidate within the
//! tie band of the top accepted confidence. Nothing above the threshold
//! means an empty assignment — a legitimate terminal outcome.
//!
//! The band is anchored at the top *accepted* candidate, so a
//! sub-threshold runner-up can never drag the band below the threshold.

use ttp_atlas_core::config::MapperConfig;
use ttp_atlas_core::types::ClassificationCandidate;

/// Select the candidates to commit from a ranked sequence.
///
/// `candidates` must already be in ranked order (descending confidence,
/// ties by ascending identifier); the returned slice preserves that order.
pub(crate) fn select_accepted<'a>(
    candidates: &'a [ClassificationCandidate],
    config: &MapperConfig,
) -> Vec<&'a ClassificationCandidate> {
    let mut accepted: Vec<&ClassificationCandidate> = candidates
        .iter()
        .filter(|c| c.confidence >= config.acceptance_threshold)
        .collect();

    let Some(top) = accepted.first() else {
        return Vec::new();
    };
    let floor = top.confidence - config.tie_band;
    accepted.retain(|c| c.confidence >= floor);
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use ttp_atlas_core::types::{ScoringMethod, TaxonomyVersion, TechniqueId};

    fn candidate(id: &str, confidence: f32) -> ClassificationCandidate {
        ClassificationCandidate {
            technique_id: TechniqueId::new(id).unwrap(),
            taxonomy_version: TaxonomyVersion::FIRST,
            confidence,
            method: ScoringMethod::ZeroShot,
        }
    }

    fn config() -> MapperConfig {
        MapperConfig::default() // threshold 0.6, tie band 0.05
    }

    #[test]
    fn test_co_equal_candidates_commit_together() {
        // 0.9 and 0.87 are within the 0.05 band and both above 0.6.
        let candidates = vec![candidate("T1059", 0.9), candidate("T1566", 0.87)];
        let accepted = select_accepted(&candidates, &config());
        assert_eq!(accepted.len(), 2);
    }

    #[test]
    fn test_candidate_outside_band_is_excluded() {
        let candidates = vec![
            candidate("T1059", 0.9),
            candidate("T1566", 0.87),
            candidate("T1190", 0.7), // above threshold, outside band
        ];
        let accepted = select_accepted(&candidates, &config());
        assert_eq!(accepted.len(), 2);
    }

    #[test]
    fn test_all_below_threshold_selects_nothing() {
        let candidates = vec![candidate("T1059", 0.59), candidate("T1566", 0.3)];
        assert!(select_accepted(&candidates, &config()).is_empty());
    }

    #[test]
    fn test_band_does_not_reach_below_threshold() {
        // Top accepted is 0.62; 0.58 is within the band numerically but
        // below the acceptance threshold, so it stays out.
        let candidates = vec![candidate("T1059", 0.62), candidate("T1566", 0.58)];
        let accepted = select_accepted(&candidates, &config());
        assert_eq!(accepted.len(), 1);
        assert_eq!(accepted[0].technique_id.as_str(), "T1059");
    }

    #[test]
    fn test_empty_input_selects_nothing() {
        assert!(select_accepted(&[], &config()).is_empty());
    }
}
