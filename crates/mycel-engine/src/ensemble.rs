//! Async ensemble combiner.
//!
//! Fans one task out per sub-model, bounds each with the configured
//! timeout, and joins at a barrier. A failed or timed-out sub-model
//! degrades the estimate to the survivors; it never fails the prediction
//! unless nothing survives.

use crate::config::EnsembleConfig;
use chrono::{DateTime, Utc};
use mycel_core::submodel::{agreement_confidence, weighted_combine};
use mycel_core::{CoreError, FeatureBundle, ModelError, SubModel};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Sub-model agreement below this flags an unreliable combination.
const LOW_AGREEMENT: f64 = 0.5;

#[derive(Debug, Clone)]
pub struct EnsemblePredictor {
    bank: Vec<(SubModel, f64)>,
    model_timeout: Duration,
}

impl EnsemblePredictor {
    /// The standard three-model bank.
    pub fn new(config: EnsembleConfig) -> Self {
        Self::with_bank(SubModel::default_bank(), config)
    }

    /// A custom bank of (model, combination weight) pairs.
    pub fn with_bank(bank: Vec<(SubModel, f64)>, config: EnsembleConfig) -> Self {
        Self {
            bank,
            model_timeout: Duration::from_millis(config.model_timeout_ms),
        }
    }

    /// Combine all sub-model predictions for one unit and epoch.
    ///
    /// Errors only with [`CoreError::EnsembleExhausted`] when every
    /// sub-model failed; any partial survival produces a degraded estimate.
    pub async fn predict(
        &self,
        unit_id: &str,
        timestamp: DateTime<Utc>,
        features: FeatureBundle,
    ) -> Result<mycel_core::EnsembleEstimate, CoreError> {
        let features = Arc::new(features);

        // Fan-out: one task per sub-model, all over the same read-only bundle.
        let handles: Vec<_> = self
            .bank
            .iter()
            .map(|(model, weight)| {
                let model = model.clone();
                let features = Arc::clone(&features);
                let name = model.name();
                let handle = tokio::spawn(async move { model.predict(&features) });
                (name, *weight, handle)
            })
            .collect();

        // Fan-in barrier: wait for every non-failed sub-model.
        let mut outputs = BTreeMap::new();
        let mut errors = BTreeMap::new();
        let mut survivors = Vec::new();
        for (name, weight, handle) in handles {
            match timeout(self.model_timeout, handle).await {
                Ok(Ok(Ok(score))) => {
                    outputs.insert(name.to_string(), score);
                    survivors.push((score, weight));
                }
                Ok(Ok(Err(model_err))) => {
                    errors.insert(name.to_string(), model_err.to_string());
                }
                Ok(Err(join_err)) => {
                    errors.insert(name.to_string(), format!("task failed: {join_err}"));
                }
                Err(_) => {
                    let err = ModelError::TimedOut {
                        model: name,
                        ms: self.model_timeout.as_millis() as u64,
                    };
                    errors.insert(name.to_string(), err.to_string());
                }
            }
        }

        let Some(combined_score) = weighted_combine(&survivors) else {
            warn!(unit_id, "every ensemble sub-model failed");
            return Err(CoreError::EnsembleExhausted);
        };

        let scores: Vec<f64> = survivors.iter().map(|(s, _)| *s).collect();
        let confidence = agreement_confidence(&scores);
        let degraded = !errors.is_empty();

        let mut warnings = Vec::new();
        if confidence < LOW_AGREEMENT {
            warnings.push("low model agreement, prediction may be unreliable".to_string());
        }
        if degraded {
            warn!(
                unit_id,
                failed = errors.len(),
                surviving = outputs.len(),
                "ensemble degraded"
            );
        } else {
            debug!(unit_id, combined_score, "ensemble prediction");
        }

        Ok(mycel_core::EnsembleEstimate {
            unit_id: unit_id.to_string(),
            timestamp,
            sub_model_outputs: outputs,
            sub_model_errors: errors,
            combined_score,
            combination_method: "weighted_average".to_string(),
            confidence,
            degraded,
            warnings,
        })
    }
}
