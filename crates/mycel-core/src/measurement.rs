//! Measurement records and per-unit normalized vectors.
//!
//! Both types are transient: created per ingestion event and retained only
//! long enough to compute a composite score.

use crate::biome::Biome;
use crate::parameter::ParameterKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One raw field measurement for one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterMeasurement {
    pub unit_id: String,
    pub kind: ParameterKind,
    pub biome: Biome,
    pub raw_value: f64,
    pub timestamp: DateTime<Utc>,
}

impl ParameterMeasurement {
    pub fn new(
        unit_id: &str,
        kind: ParameterKind,
        biome: Biome,
        raw_value: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            unit_id: unit_id.to_string(),
            kind,
            biome,
            raw_value,
            timestamp,
        }
    }
}

/// Normalized parameter values for one unit at one epoch.
///
/// A complete vector holds exactly one entry per defined kind. Partial
/// vectors are permitted for partial analyses but the scorer refuses them
/// unless partial mode is explicitly requested.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedVector {
    values: BTreeMap<ParameterKind, f64>,
}

impl NormalizedVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one normalized value. Values are produced by the normalizer and
    /// are always inside [0, 1].
    pub fn set(&mut self, kind: ParameterKind, value: f64) {
        debug_assert!((0.0..=1.0).contains(&value), "normalized value out of range");
        self.values.insert(kind, value);
    }

    /// Builder-style set.
    pub fn with(mut self, kind: ParameterKind, value: f64) -> Self {
        self.set(kind, value);
        self
    }

    pub fn get(&self, kind: ParameterKind) -> Option<f64> {
        self.values.get(&kind).copied()
    }

    pub fn is_complete(&self) -> bool {
        ParameterKind::ALL.iter().all(|k| self.values.contains_key(k))
    }

    /// Kinds absent from this vector, in weight-table order.
    pub fn missing(&self) -> Vec<ParameterKind> {
        ParameterKind::ALL
            .iter()
            .copied()
            .filter(|k| !self.values.contains_key(k))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParameterKind, f64)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completeness_tracking() {
        let mut vector = NormalizedVector::new();
        assert!(!vector.is_complete());
        assert_eq!(vector.missing().len(), 8);

        for kind in ParameterKind::ALL {
            vector.set(kind, 0.5);
        }
        assert!(vector.is_complete());
        assert!(vector.missing().is_empty());
    }

    #[test]
    fn test_set_replaces() {
        let vector = NormalizedVector::new()
            .with(ParameterKind::RhoE, 0.4)
            .with(ParameterKind::RhoE, 0.6);
        assert_eq!(vector.len(), 1);
        assert_eq!(vector.get(ParameterKind::RhoE), Some(0.6));
    }
}
