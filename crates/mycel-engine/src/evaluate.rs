//! Batch site evaluation.
//!
//! Scoring of distinct units is embarrassingly parallel: each unit's
//! normalization and scoring runs in its own task over the shared
//! read-only reference store. Alert transitions mutate per-unit state and
//! are applied serially by the engine, which owns the alert manager.
//! Cancellation is per-unit: units already scored keep their results.

use crate::config::EngineConfig;
use chrono::{DateTime, Utc};
use mycel_core::stats::{summarize, ScoreSummary};
use mycel_core::{
    AlertManager, AlertTransition, CompositeScore, CompositeScorer, CoreError,
    EarlyWarning, NormalizedVector, ParameterKind, ParameterMeasurement,
    ParameterNormalizer, ReferenceStore, ScoreHistory, TrendDetector,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

/// Normalized value at or below this marks a parameter as an alert trigger.
const TRIGGER_CEILING: f64 = 0.25;

/// One unit's measurements for a sampling cycle. Each measurement names
/// its own biome, per the data model; a unit's records all share one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitCycle {
    pub unit_id: String,
    pub measurements: Vec<ParameterMeasurement>,
}

/// A unit whose evaluation failed this cycle. The batch carries on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitFailure {
    pub unit_id: String,
    pub error: String,
}

/// Everything one evaluation cycle produced for a site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteReport {
    pub site_id: String,
    pub scores: Vec<CompositeScore>,
    pub transitions: Vec<AlertTransition>,
    pub early_warnings: Vec<EarlyWarning>,
    pub failures: Vec<UnitFailure>,
    /// Units skipped because the cycle was cancelled.
    pub cancelled: usize,
    /// Distribution summary over the cycle's scores, absent when nothing
    /// scored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<ScoreSummary>,
}

/// Scoring engine: owns the score history and the alert manager, shares
/// the immutable reference store with its workers.
pub struct Engine {
    store: Arc<ReferenceStore>,
    config: EngineConfig,
    history: ScoreHistory,
    alerts: AlertManager,
    trend: TrendDetector,
}

impl Engine {
    pub fn new(store: Arc<ReferenceStore>, config: EngineConfig) -> Self {
        info!(references = store.len(), "engine initialized");
        let alerts = AlertManager::new(config.alerts);
        let trend = TrendDetector::new(config.trend.clone());
        Self {
            store,
            config,
            history: ScoreHistory::new(),
            alerts,
            trend,
        }
    }

    /// Score one unit without touching history or alert state.
    pub fn score_unit(&self, unit: &UnitCycle) -> Result<CompositeScore, CoreError> {
        score_cycle(&self.store, self.config.partial_scoring, unit).map(|s| s.score)
    }

    /// Evaluate a full site cycle: concurrent scoring, trend detection over
    /// each unit's history, then serialized alert transitions.
    pub async fn evaluate_site(
        &mut self,
        site_id: &str,
        cycle: Vec<UnitCycle>,
        cancel: &CancellationToken,
    ) -> SiteReport {
        let total = cycle.len();
        let mut report = SiteReport {
            site_id: site_id.to_string(),
            scores: Vec::new(),
            transitions: Vec::new(),
            early_warnings: Vec::new(),
            failures: Vec::new(),
            cancelled: 0,
            summary: None,
        };

        let mut handles = Vec::new();
        for unit in cycle {
            if cancel.is_cancelled() {
                report.cancelled += 1;
                continue;
            }
            let store = Arc::clone(&self.store);
            let partial = self.config.partial_scoring;
            handles.push(tokio::spawn(async move {
                let unit_id = unit.unit_id.clone();
                (unit_id, score_cycle(&store, partial, &unit))
            }));
        }

        for handle in handles {
            let (unit_id, outcome) = match handle.await {
                Ok(result) => result,
                Err(join_err) => {
                    warn!(%join_err, "scoring task failed");
                    continue;
                }
            };
            match outcome {
                Err(err) => {
                    warn!(%unit_id, %err, "unit evaluation failed");
                    report.failures.push(UnitFailure {
                        unit_id,
                        error: err.to_string(),
                    });
                }
                Ok(scored) => {
                    self.apply_scored_unit(site_id, scored, &mut report);
                }
            }
        }

        report.summary = summarize(&report.scores);

        info!(
            site_id,
            total,
            scored = report.scores.len(),
            failed = report.failures.len(),
            cancelled = report.cancelled,
            transitions = report.transitions.len(),
            "site cycle evaluated"
        );
        report
    }

    /// History and alert mutation for one scored unit; the serialized
    /// section of the pipeline.
    fn apply_scored_unit(&mut self, site_id: &str, scored: ScoredUnit, report: &mut SiteReport) {
        let ScoredUnit { score, vector } = scored;
        let unit_id = score.unit_id.clone();
        let tier = score.tier;
        let evaluated_at = score.timestamp;

        self.history.push(score.clone());
        report.scores.push(score);

        let series = self.history.series(&unit_id);
        let warning = self.trend.detect(&unit_id, &series);

        let triggers = trigger_parameters(&vector);
        let transitions = self.alerts.evaluate(
            &unit_id,
            site_id,
            tier,
            warning.as_ref(),
            &triggers,
            evaluated_at,
        );
        report.transitions.extend(transitions);
        if let Some(warning) = warning {
            report.early_warnings.push(warning);
        }
    }

    /// Operator acknowledgement passthrough.
    pub fn acknowledge(
        &mut self,
        alert_id: Uuid,
        now: DateTime<Utc>,
    ) -> Option<AlertTransition> {
        self.alerts.acknowledge(alert_id, now)
    }

    pub fn history(&self) -> &ScoreHistory {
        &self.history
    }

    pub fn alerts(&self) -> &AlertManager {
        &self.alerts
    }
}

struct ScoredUnit {
    score: CompositeScore,
    vector: NormalizedVector,
}

/// Pure per-unit scoring, safe to run concurrently across units.
fn score_cycle(
    store: &Arc<ReferenceStore>,
    partial: bool,
    unit: &UnitCycle,
) -> Result<ScoredUnit, CoreError> {
    let normalizer = ParameterNormalizer::new(Arc::clone(store));
    let vector = normalizer.normalize_all(&unit.measurements)?;
    let timestamp = unit
        .measurements
        .iter()
        .map(|m| m.timestamp)
        .max()
        .unwrap_or_else(Utc::now);
    let score = CompositeScorer::new()
        .allow_partial(partial)
        .score(&unit.unit_id, timestamp, &vector)?;
    Ok(ScoredUnit { score, vector })
}

/// Parameters pinned low enough to name on an alert.
fn trigger_parameters(vector: &NormalizedVector) -> Vec<ParameterKind> {
    vector
        .iter()
        .filter(|(_, value)| *value <= TRIGGER_CEILING)
        .map(|(kind, _)| kind)
        .collect()
}
