//! Ensemble sub-models over a shared feature bundle.
//!
//! Three independently-fitted model flavors sit behind one capability:
//! `predict(&FeatureBundle) -> Result<f64, ModelError>`. Flavors are
//! tagged variants rather than a trait hierarchy, so a new flavor is one
//! more variant and the combiner never changes. Each variant carries its
//! fixed learned coefficients; versioned artifact storage is an external
//! concern.

use crate::error::ModelError;
use crate::measurement::NormalizedVector;
use crate::parameter::ParameterKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Inputs a sub-model may consume. Each model declares what it needs and
/// fails with `MissingInput` when its slice of the bundle is absent.
#[derive(Debug, Clone, Default)]
pub struct FeatureBundle {
    /// Normalized parameter vector for the epoch.
    pub normalized: Option<NormalizedVector>,
    /// Recent bioelectrical spike-rate samples, normalized pulse densities.
    pub spike_rates: Option<Vec<f64>>,
    /// Recent composite values, oldest first.
    pub score_history: Option<Vec<f64>>,
}

impl FeatureBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_normalized(mut self, vector: NormalizedVector) -> Self {
        self.normalized = Some(vector);
        self
    }

    pub fn with_spike_rates(mut self, rates: Vec<f64>) -> Self {
        self.spike_rates = Some(rates);
        self
    }

    pub fn with_score_history(mut self, history: Vec<f64>) -> Self {
        self.score_history = Some(history);
        self
    }
}

/// Spike-pattern scorer over bioelectrical activity: high, stable pulse
/// density reads healthy; erratic bursting reads stressed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpikePatternModel {
    pub bias: f64,
    pub w_mean_rate: f64,
    pub w_dispersion: f64,
    pub w_burst: f64,
}

impl Default for SpikePatternModel {
    fn default() -> Self {
        // Coefficients fitted on the reference spike-train corpus.
        Self {
            bias: -2.2,
            w_mean_rate: 6.5,
            w_dispersion: -1.8,
            w_burst: 0.9,
        }
    }
}

/// Tabular scorer over the eight normalized parameters, with its own
/// importance table and hard-signal corrections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabularModel {
    /// Penalty applied when the exchange ratio is deeply depressed.
    pub ser_floor_penalty: f64,
    pub rho_floor_penalty: f64,
}

impl Default for TabularModel {
    fn default() -> Self {
        Self {
            ser_floor_penalty: 0.08,
            rho_floor_penalty: 0.05,
        }
    }
}

/// Sequence scorer extrapolating recent composite history with an
/// exponentially weighted mean plus a momentum term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceModel {
    pub alpha: f64,
    pub momentum: f64,
}

impl Default for SequenceModel {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            momentum: 0.5,
        }
    }
}

/// Tagged sub-model variants behind the single predict capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "flavor", rename_all = "snake_case")]
pub enum SubModel {
    SpikePattern(SpikePatternModel),
    Tabular(TabularModel),
    Sequence(SequenceModel),
}

impl SubModel {
    pub fn name(&self) -> &'static str {
        match self {
            SubModel::SpikePattern(_) => "spike_pattern",
            SubModel::Tabular(_) => "tabular",
            SubModel::Sequence(_) => "sequence",
        }
    }

    /// Score the bundle in [0, 1]. Pure and deterministic.
    pub fn predict(&self, features: &FeatureBundle) -> Result<f64, ModelError> {
        match self {
            SubModel::SpikePattern(model) => {
                let rates = features
                    .spike_rates
                    .as_deref()
                    .filter(|r| !r.is_empty())
                    .ok_or(ModelError::MissingInput {
                        model: self.name(),
                        input: "spike_rates",
                    })?;
                if rates.iter().any(|r| !r.is_finite()) {
                    return Err(ModelError::Failed {
                        model: self.name(),
                        reason: "non-finite spike rate".to_string(),
                    });
                }
                Ok(model.score(rates))
            }
            SubModel::Tabular(model) => {
                let vector = features
                    .normalized
                    .as_ref()
                    .filter(|v| !v.is_empty())
                    .ok_or(ModelError::MissingInput {
                        model: self.name(),
                        input: "normalized",
                    })?;
                Ok(model.score(vector))
            }
            SubModel::Sequence(model) => {
                let history = features
                    .score_history
                    .as_deref()
                    .filter(|h| h.len() >= 2)
                    .ok_or(ModelError::MissingInput {
                        model: self.name(),
                        input: "score_history",
                    })?;
                Ok(model.score(history))
            }
        }
    }

    /// The standard three-model bank with its fixed combination weights.
    pub fn default_bank() -> Vec<(SubModel, f64)> {
        vec![
            (SubModel::SpikePattern(SpikePatternModel::default()), 0.38),
            (SubModel::Tabular(TabularModel::default()), 0.32),
            (SubModel::Sequence(SequenceModel::default()), 0.30),
        ]
    }
}

impl SpikePatternModel {
    fn score(&self, rates: &[f64]) -> f64 {
        let n = rates.len() as f64;
        let mean = rates.iter().sum::<f64>() / n;
        let var = rates.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
        let std = var.sqrt();
        let dispersion = if mean > 0.0 { std / mean } else { 0.0 };
        let burst_fraction =
            rates.iter().filter(|&&r| r > mean + std).count() as f64 / n;

        let z = self.bias
            + self.w_mean_rate * mean
            + self.w_dispersion * dispersion
            + self.w_burst * burst_fraction;
        1.0 / (1.0 + (-z).exp())
    }
}

impl TabularModel {
    /// Per-kind importance; distinct from the composite weight table.
    fn importance(kind: ParameterKind) -> f64 {
        match kind {
            ParameterKind::RhoE => 0.22,
            ParameterKind::KTopo => 0.18,
            ParameterKind::EtaNw => 0.15,
            ParameterKind::GradC => 0.12,
            ParameterKind::Ser => 0.12,
            ParameterKind::Arc => 0.10,
            ParameterKind::Abi => 0.06,
            ParameterKind::Bfs => 0.05,
        }
    }

    fn score(&self, vector: &NormalizedVector) -> f64 {
        let mut weighted = 0.0;
        let mut weight_sum = 0.0;
        for (kind, value) in vector.iter() {
            weighted += Self::importance(kind) * value;
            weight_sum += Self::importance(kind);
        }
        let mut score = weighted / weight_sum;
        // Hard signals: a collapsed exchange ratio or silent pulse field
        // drags the prediction below what the average suggests.
        if vector.get(ParameterKind::Ser).is_some_and(|v| v < 0.30) {
            score -= self.ser_floor_penalty;
        }
        if vector.get(ParameterKind::RhoE).is_some_and(|v| v < 0.25) {
            score -= self.rho_floor_penalty;
        }
        score.clamp(0.0, 1.0)
    }
}

impl SequenceModel {
    fn score(&self, history: &[f64]) -> f64 {
        let mut ewm = history[0];
        for value in &history[1..] {
            ewm = self.alpha * value + (1.0 - self.alpha) * ewm;
        }
        let last = history[history.len() - 1];
        let prev = history[history.len() - 2];
        (ewm + self.momentum * (last - prev)).clamp(0.0, 1.0)
    }
}

/// Combined output of the ensemble for one unit and epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleEstimate {
    pub unit_id: String,
    pub timestamp: DateTime<Utc>,
    /// Every surviving sub-model's individual output, for ablation.
    pub sub_model_outputs: BTreeMap<String, f64>,
    /// Failure descriptions for sub-models that did not survive.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sub_model_errors: BTreeMap<String, String>,
    pub combined_score: f64,
    pub combination_method: String,
    /// Agreement between surviving models: 1 − population std-dev.
    pub confidence: f64,
    /// True when any sub-model failed or timed out.
    pub degraded: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Weighted average over surviving (score, weight) pairs, weights
/// renormalized over the survivors. `None` when nothing survived.
pub fn weighted_combine(scored: &[(f64, f64)]) -> Option<f64> {
    let weight_sum: f64 = scored.iter().map(|(_, w)| w).sum();
    if scored.is_empty() || weight_sum <= 0.0 {
        return None;
    }
    Some(scored.iter().map(|(s, w)| s * w).sum::<f64>() / weight_sum)
}

/// Agreement confidence over surviving scores: a lone survivor gets the
/// single-model default of 0.7.
pub fn agreement_confidence(scores: &[f64]) -> f64 {
    match scores.len() {
        0 => 0.0,
        1 => 0.7,
        n => {
            let n = n as f64;
            let mean = scores.iter().sum::<f64>() / n;
            let var = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
            (1.0 - var.sqrt()).max(0.0)
        }
    }
}

/// Validation hook: the ensemble estimate against the composite score it
/// should track.
pub fn estimate_deviation(estimate: &EnsembleEstimate, composite_value: f64) -> f64 {
    estimate.combined_score - composite_value
}
