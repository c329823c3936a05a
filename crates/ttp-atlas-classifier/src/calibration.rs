//! Confidence calibration.
//!
//! Raw similarity scores are not probabilities: a cosine of 0.8 against a
//! thin centroid does not mean "80% likely correct". The calibration map
//! turns raw scores into calibrated confidences using the feedback record:
//! scores are bucketed, each bucket's empirical precision (fraction of
//! outcomes the reviewers confirmed) is computed, and pool-adjacent-
//! violators enforces monotonicity before the buckets become knots of a
//! piecewise-linear map.
//!
//! With fewer than `min_events` outcomes the map is the identity — a
//! freshly bootstrapped deployment serves raw scores rather than a map
//! fitted to noise.

use serde::{Deserialize, Serialize};

/// Number of score buckets used when fitting.
const FIT_BUCKETS: usize = 10;

/// Monotone piecewise-linear map from raw score to confidence, both in
/// [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationMap {
    /// (raw score, calibrated confidence) knots, strictly increasing in
    /// the first component, non-decreasing in the second.
    knots: Vec<(f32, f32)>,
}

impl CalibrationMap {
    /// The identity map.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            knots: vec![(0.0, 0.0), (1.0, 1.0)],
        }
    }

    /// True if this is the identity map.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.knots == [(0.0, 0.0), (1.0, 1.0)]
    }

    /// Fit a map from `(raw score, confirmed)` outcomes.
    ///
    /// Falls back to the identity map when fewer than `min_events`
    /// outcomes exist. Output is always monotone non-decreasing and
    /// clamped to [0, 1].
    #[must_use]
    pub fn fit(outcomes: &[(f32, bool)], min_events: usize) -> Self {
        if outcomes.len() < min_events.max(FIT_BUCKETS) {
            return Self::identity();
        }

        let mut sorted: Vec<(f32, bool)> = outcomes
            .iter()
            .filter(|(score, _)| score.is_finite())
            .map(|&(score, ok)| (score.clamp(0.0, 1.0), ok))
            .collect();
        if sorted.len() < min_events.max(FIT_BUCKETS) {
            return Self::identity();
        }
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        // Equal-count buckets: (mean score, empirical precision, weight).
        let bucket_size = sorted.len().div_ceil(FIT_BUCKETS);
        let mut buckets: Vec<(f32, f32, f32)> = Vec::with_capacity(FIT_BUCKETS);
        for chunk in sorted.chunks(bucket_size) {
            let n = chunk.len() as f32;
            let mean = chunk.iter().map(|(s, _)| s).sum::<f32>() / n;
            let precision = chunk.iter().filter(|(_, ok)| *ok).count() as f32 / n;
            buckets.push((mean, precision, n));
        }

        pool_adjacent_violators(&mut buckets);

        // Collapse buckets whose mean scores coincide, then anchor the ends.
        let mut knots: Vec<(f32, f32)> = Vec::with_capacity(buckets.len() + 2);
        for (mean, precision, _) in buckets {
            match knots.last() {
                Some(&(x, _)) if mean <= x => {}
                _ => knots.push((mean, precision)),
            }
        }
        if let (Some(&(first_x, first_y)), Some(&(last_x, last_y))) =
            (knots.first(), knots.last())
        {
            if first_x > 0.0 {
                knots.insert(0, (0.0, first_y));
            }
            if last_x < 1.0 {
                knots.push((1.0, last_y));
            }
        } else {
            return Self::identity();
        }

        Self { knots }
    }

    /// Map a raw score to a calibrated confidence.
    #[must_use]
    pub fn apply(&self, raw: f32) -> f32 {
        let x = raw.clamp(0.0, 1.0);
        let mut iter = self.knots.windows(2);
        while let Some(&[(x0, y0), (x1, y1)]) = iter.next() {
            if x <= x1 {
                if x1 == x0 {
                    return y1.clamp(0.0, 1.0);
                }
                let t = (x - x0) / (x1 - x0);
                return (y0 + t * (y1 - y0)).clamp(0.0, 1.0);
            }
        }
        self.knots.last().map_or(x, |&(_, y)| y).clamp(0.0, 1.0)
    }
}

impl Default for CalibrationMap {
    fn default() -> Self {
        Self::identity()
    }
}

/// Pool-adjacent-violators: merge neighboring buckets until the precision
/// sequence is non-decreasing. Merged buckets take the weighted mean of
/// both components.
fn pool_adjacent_violators(buckets: &mut Vec<(f32, f32, f32)>) {
    let mut i = 0;
    while i + 1 < buckets.len() {
        if buckets[i].1 > buckets[i + 1].1 {
            let (x0, y0, w0) = buckets[i];
            let (x1, y1, w1) = buckets[i + 1];
            let w = w0 + w1;
            buckets[i] = ((x0 * w0 + x1 * w1) / w, (y0 * w0 + y1 * w1) / w, w);
            buckets.remove(i + 1);
            // A merge can create a new violation to the left.
            i = i.saturating_sub(1);
        } else {
            i += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcomes(n: usize, precision_of: impl Fn(f32) -> f32) -> Vec<(f32, bool)> {
        // Deterministic synthetic outcomes: for each score level, mark the
        // leading fraction confirmed.
        let mut out = Vec::with_capacity(n);
        for i in 0..n {
            let score = i as f32 / (n - 1) as f32;
            let confirmed = (i % 10) as f32 / 10.0 < precision_of(score);
            out.push((score, confirmed));
        }
        out
    }

    #[test]
    fn test_too_few_events_yields_identity() {
        let map = CalibrationMap::fit(&[(0.5, true); 3], 20);
        assert!(map.is_identity());
        assert!((map.apply(0.42) - 0.42).abs() < 1e-6);
    }

    #[test]
    fn test_identity_bounds() {
        let map = CalibrationMap::identity();
        assert_eq!(map.apply(-0.5), 0.0);
        assert_eq!(map.apply(1.5), 1.0);
    }

    #[test]
    fn test_fitted_map_is_monotone() {
        let map = CalibrationMap::fit(&outcomes(200, |s| s), 20);
        let mut prev = map.apply(0.0);
        for i in 1..=100 {
            let y = map.apply(i as f32 / 100.0);
            assert!(y >= prev - 1e-6, "map must be non-decreasing");
            assert!((0.0..=1.0).contains(&y));
            prev = y;
        }
    }

    #[test]
    fn test_fit_flattens_inverted_precision() {
        // Precision DECREASES with score; PAV must flatten, not invert.
        let map = CalibrationMap::fit(&outcomes(200, |s| 1.0 - s), 20);
        let low = map.apply(0.1);
        let high = map.apply(0.9);
        assert!(high >= low - 1e-6);
    }

    #[test]
    fn test_overconfident_scores_are_pulled_down() {
        // Only 30% of high-scoring outcomes confirmed: a raw 0.9 must not
        // survive as 0.9.
        let map = CalibrationMap::fit(&outcomes(200, |_| 0.3), 20);
        assert!(map.apply(0.9) < 0.5);
    }

    #[test]
    fn test_non_finite_outcomes_are_ignored() {
        let mut data = outcomes(50, |s| s);
        data.push((f32::NAN, true));
        let map = CalibrationMap::fit(&data, 20);
        let y = map.apply(0.5);
        assert!(y.is_finite());
    }
}
