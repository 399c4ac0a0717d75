//! Composite score computation.
//!
//! The composite index is a weighted sum of the eight normalized
//! parameters pushed through a sigmoid correction:
//!
//!   linear = Σ wₖ·nₖ
//!   value  = σ(6.0·linear − 3.0),  σ(z) = 1/(1+e⁻ᶻ)
//!
//! Pure function of the vector; no hidden state.

use crate::error::CoreError;
use crate::measurement::NormalizedVector;
use crate::tier::Tier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sigmoid slope.
pub const K_SLOPE: f64 = 6.0;
/// Sigmoid offset.
pub const BETA: f64 = -3.0;

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// One scored epoch for one unit. Derived, never edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeScore {
    pub unit_id: String,
    pub timestamp: DateTime<Utc>,
    /// Final composite value in [0, 1]; higher is healthier.
    pub value: f64,
    /// Pre-sigmoid weighted sum, kept for validation against sub-models.
    pub linear: f64,
    pub tier: Tier,
    /// True when the vector was partial and weights were redistributed.
    pub partial: bool,
    /// Boundary-saturation flags for parameters pinned at the reference edges.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Composite scorer. Complete vectors only, unless partial mode is
/// explicitly enabled, in which case missing weights are redistributed
/// proportionally across present kinds.
#[derive(Debug, Clone, Default)]
pub struct CompositeScorer {
    allow_partial: bool,
}

impl CompositeScorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opt in to partial scoring. This is a documented fallback, never the
    /// silent default.
    pub fn allow_partial(mut self, allow: bool) -> Self {
        self.allow_partial = allow;
        self
    }

    pub fn score(
        &self,
        unit_id: &str,
        timestamp: DateTime<Utc>,
        vector: &NormalizedVector,
    ) -> Result<CompositeScore, CoreError> {
        let missing = vector.missing();
        if !missing.is_empty() && !self.allow_partial {
            return Err(CoreError::IncompleteVector { missing });
        }
        if vector.is_empty() {
            return Err(CoreError::IncompleteVector { missing });
        }

        let mut weighted = 0.0;
        let mut weight_sum = 0.0;
        let mut warnings = Vec::new();
        for (kind, value) in vector.iter() {
            weighted += kind.weight() * value;
            weight_sum += kind.weight();
            if value <= 0.0 {
                warnings.push(format!("{} at reference minimum", kind.symbol()));
            } else if value >= 1.0 {
                warnings.push(format!("{} at reference maximum", kind.symbol()));
            }
        }

        let linear = weighted / weight_sum;
        let value = sigmoid(K_SLOPE * linear + BETA);

        Ok(CompositeScore {
            unit_id: unit_id.to_string(),
            timestamp,
            value,
            linear,
            tier: Tier::from_score(value),
            partial: !missing.is_empty(),
            warnings,
        })
    }
}

/// Append-only score history, keyed by unit id and ordered by insertion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreHistory {
    by_unit: BTreeMap<String, Vec<CompositeScore>>,
}

impl ScoreHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, score: CompositeScore) {
        self.by_unit
            .entry(score.unit_id.clone())
            .or_default()
            .push(score);
    }

    pub fn for_unit(&self, unit_id: &str) -> &[CompositeScore] {
        self.by_unit.get(unit_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn latest(&self, unit_id: &str) -> Option<&CompositeScore> {
        self.for_unit(unit_id).last()
    }

    /// (timestamp, value) series for trend detection.
    pub fn series(&self, unit_id: &str) -> Vec<(DateTime<Utc>, f64)> {
        self.for_unit(unit_id)
            .iter()
            .map(|s| (s.timestamp, s.value))
            .collect()
    }

    pub fn units(&self) -> impl Iterator<Item = &str> {
        self.by_unit.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_unit.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_unit.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::ParameterKind;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 6, 0, 0).unwrap()
    }

    fn uniform_vector(value: f64) -> NormalizedVector {
        let mut vector = NormalizedVector::new();
        for kind in ParameterKind::ALL {
            vector.set(kind, value);
        }
        vector
    }

    #[test]
    fn test_value_stays_in_unit_interval() {
        let scorer = CompositeScorer::new();
        for step in 0..=10 {
            let vector = uniform_vector(step as f64 / 10.0);
            let score = scorer.score("mnu-001", ts(), &vector).unwrap();
            assert!((0.0..=1.0).contains(&score.value));
        }
    }

    #[test]
    fn test_determinism() {
        let scorer = CompositeScorer::new();
        let vector = uniform_vector(0.63);
        let a = scorer.score("mnu-001", ts(), &vector).unwrap();
        let b = scorer.score("mnu-001", ts(), &vector).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_incomplete_vector_rejected_by_default() {
        let scorer = CompositeScorer::new();
        let vector = NormalizedVector::new().with(ParameterKind::RhoE, 0.8);
        let err = scorer.score("mnu-001", ts(), &vector).unwrap_err();
        assert!(matches!(err, CoreError::IncompleteVector { ref missing } if missing.len() == 7));
    }

    #[test]
    fn test_partial_mode_redistributes_weights() {
        let scorer = CompositeScorer::new().allow_partial(true);
        // Two kinds at the same level: redistributed weights keep the
        // linear term at that level.
        let vector = NormalizedVector::new()
            .with(ParameterKind::RhoE, 0.6)
            .with(ParameterKind::KTopo, 0.6);
        let score = scorer.score("mnu-001", ts(), &vector).unwrap();
        assert!(score.partial);
        assert_relative_eq!(score.linear, 0.6, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_vector_rejected_even_in_partial_mode() {
        let scorer = CompositeScorer::new().allow_partial(true);
        let err = scorer
            .score("mnu-001", ts(), &NormalizedVector::new())
            .unwrap_err();
        assert!(matches!(err, CoreError::IncompleteVector { .. }));
    }

    #[test]
    fn test_boundary_warnings() {
        let scorer = CompositeScorer::new().allow_partial(true);
        let vector = NormalizedVector::new()
            .with(ParameterKind::RhoE, 0.0)
            .with(ParameterKind::Ser, 1.0)
            .with(ParameterKind::KTopo, 0.5);
        let score = scorer.score("mnu-001", ts(), &vector).unwrap();
        assert!(score.warnings.iter().any(|w| w == "ρ_e at reference minimum"));
        assert!(score.warnings.iter().any(|w| w == "SER at reference maximum"));
        assert_eq!(score.warnings.len(), 2);
    }

    #[test]
    fn test_history_is_append_only_per_unit() {
        let scorer = CompositeScorer::new();
        let mut history = ScoreHistory::new();
        for day in 1..=3 {
            let ts = Utc.with_ymd_and_hms(2026, 3, day, 6, 0, 0).unwrap();
            let score = scorer.score("mnu-007", ts, &uniform_vector(0.5)).unwrap();
            history.push(score);
        }
        assert_eq!(history.for_unit("mnu-007").len(), 3);
        assert_eq!(history.for_unit("mnu-unknown").len(), 0);
        assert_eq!(history.series("mnu-007").len(), 3);
    }
}
