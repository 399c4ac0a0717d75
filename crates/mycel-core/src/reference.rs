//! Biome-specific reference distributions.
//!
//! The store is constructed once at startup, shared read-only across all
//! scoring workers, and never mutated afterwards. It is passed explicitly
//! (dependency injection), never held in a global.

use crate::biome::Biome;
use crate::error::CoreError;
use crate::parameter::ParameterKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Expected distribution of one parameter in one biome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceDistribution {
    /// Lower bound of the reference range.
    pub lower: f64,
    /// Upper bound of the reference range.
    pub upper: f64,
    pub mean: f64,
    pub std_dev: f64,
    /// Optimal band for two-sided kinds; values inside it normalize to 1.0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimal_band: Option<(f64, f64)>,
}

impl ReferenceDistribution {
    /// Build from range bounds alone. The published calibration tables carry
    /// only the range; mean and spread are taken as the band midpoint and
    /// quarter-width so that ±2σ spans the reference range.
    pub fn from_range(lower: f64, upper: f64) -> Self {
        Self {
            lower,
            upper,
            mean: (lower + upper) / 2.0,
            std_dev: (upper - lower) / 4.0,
            optimal_band: None,
        }
    }

    pub fn with_optimal_band(mut self, lo: f64, hi: f64) -> Self {
        self.optimal_band = Some((lo, hi));
        self
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Immutable calibration map keyed by (biome, parameter kind).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceStore {
    entries: BTreeMap<Biome, BTreeMap<ParameterKind, ReferenceDistribution>>,
}

/// Published per-biome reference ranges (lower, upper).
const BASELINE: &[(Biome, ParameterKind, f64, f64)] = &[
    (Biome::TemperateBroadleaf, ParameterKind::EtaNw, 0.32, 0.88),
    (Biome::TemperateBroadleaf, ParameterKind::RhoE, 0.20, 0.75),
    (Biome::TemperateBroadleaf, ParameterKind::GradC, 0.40, 0.88),
    (Biome::TemperateBroadleaf, ParameterKind::Ser, 0.45, 1.60),
    (Biome::TemperateBroadleaf, ParameterKind::KTopo, 1.35, 1.85),
    (Biome::TemperateBroadleaf, ParameterKind::Abi, 1.00, 2.10),
    (Biome::TemperateBroadleaf, ParameterKind::Bfs, 0.28, 0.85),
    (Biome::TemperateBroadleaf, ParameterKind::Arc, 0.30, 0.80),
    (Biome::BorealConifer, ParameterKind::EtaNw, 0.28, 0.82),
    (Biome::BorealConifer, ParameterKind::RhoE, 0.18, 0.72),
    (Biome::BorealConifer, ParameterKind::GradC, 0.38, 0.85),
    (Biome::BorealConifer, ParameterKind::Ser, 0.42, 1.65),
    (Biome::BorealConifer, ParameterKind::KTopo, 1.30, 1.80),
    (Biome::BorealConifer, ParameterKind::Abi, 0.95, 2.00),
    (Biome::BorealConifer, ParameterKind::Bfs, 0.25, 0.82),
    (Biome::BorealConifer, ParameterKind::Arc, 0.28, 0.78),
    (Biome::TropicalMontane, ParameterKind::EtaNw, 0.35, 0.90),
    (Biome::TropicalMontane, ParameterKind::RhoE, 0.22, 0.78),
    (Biome::TropicalMontane, ParameterKind::GradC, 0.42, 0.90),
    (Biome::TropicalMontane, ParameterKind::Ser, 0.48, 1.55),
    (Biome::TropicalMontane, ParameterKind::KTopo, 1.40, 1.88),
    (Biome::TropicalMontane, ParameterKind::Abi, 1.10, 2.20),
    (Biome::TropicalMontane, ParameterKind::Bfs, 0.30, 0.88),
    (Biome::TropicalMontane, ParameterKind::Arc, 0.32, 0.82),
    (Biome::MediterraneanWoodland, ParameterKind::EtaNw, 0.30, 0.85),
    (Biome::MediterraneanWoodland, ParameterKind::RhoE, 0.19, 0.73),
    (Biome::MediterraneanWoodland, ParameterKind::GradC, 0.39, 0.86),
    (Biome::MediterraneanWoodland, ParameterKind::Ser, 0.44, 1.62),
    (Biome::MediterraneanWoodland, ParameterKind::KTopo, 1.33, 1.82),
    (Biome::MediterraneanWoodland, ParameterKind::Abi, 1.02, 2.05),
    (Biome::MediterraneanWoodland, ParameterKind::Bfs, 0.27, 0.84),
    (Biome::MediterraneanWoodland, ParameterKind::Arc, 0.29, 0.79),
    (Biome::SubarcticBirch, ParameterKind::EtaNw, 0.25, 0.78),
    (Biome::SubarcticBirch, ParameterKind::RhoE, 0.15, 0.68),
    (Biome::SubarcticBirch, ParameterKind::GradC, 0.35, 0.82),
    (Biome::SubarcticBirch, ParameterKind::Ser, 0.40, 1.70),
    (Biome::SubarcticBirch, ParameterKind::KTopo, 1.28, 1.75),
    (Biome::SubarcticBirch, ParameterKind::Abi, 0.90, 1.90),
    (Biome::SubarcticBirch, ParameterKind::Bfs, 0.22, 0.80),
    (Biome::SubarcticBirch, ParameterKind::Arc, 0.25, 0.75),
];

/// Optimal exchange bands for SER, per biome.
const SER_BANDS: &[(Biome, f64, f64)] = &[
    (Biome::TemperateBroadleaf, 0.90, 1.10),
    (Biome::BorealConifer, 0.88, 1.12),
    (Biome::TropicalMontane, 0.92, 1.08),
    (Biome::MediterraneanWoodland, 0.89, 1.11),
    (Biome::SubarcticBirch, 0.85, 1.15),
];

impl ReferenceStore {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The published calibration table: every (biome, kind) pair covered.
    pub fn baseline() -> Self {
        let mut store = Self::empty();
        for &(biome, kind, lower, upper) in BASELINE {
            store.insert(biome, kind, ReferenceDistribution::from_range(lower, upper));
        }
        for &(biome, lo, hi) in SER_BANDS {
            if let Some(dist) = store.get(biome, ParameterKind::Ser).cloned() {
                store.insert(biome, ParameterKind::Ser, dist.with_optimal_band(lo, hi));
            }
        }
        store
    }

    /// Insert or replace one calibration entry. Only meaningful during
    /// construction; the store is shared immutably afterwards.
    pub fn insert(&mut self, biome: Biome, kind: ParameterKind, dist: ReferenceDistribution) {
        self.entries.entry(biome).or_default().insert(kind, dist);
    }

    /// Builder-style insert.
    pub fn with(mut self, biome: Biome, kind: ParameterKind, dist: ReferenceDistribution) -> Self {
        self.insert(biome, kind, dist);
        self
    }

    pub fn get(&self, biome: Biome, kind: ParameterKind) -> Option<&ReferenceDistribution> {
        self.entries.get(&biome).and_then(|m| m.get(&kind))
    }

    /// Like [`get`](Self::get) but with the typed error for scoring paths.
    pub fn lookup(
        &self,
        biome: Biome,
        kind: ParameterKind,
    ) -> Result<&ReferenceDistribution, CoreError> {
        self.get(biome, kind)
            .ok_or(CoreError::ReferenceMissing { biome, kind })
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(|m| m.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
