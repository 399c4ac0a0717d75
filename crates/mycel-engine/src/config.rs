//! Engine configuration.
//!
//! Everything has a sensible default; a TOML file overrides only what it
//! names. Raw deserialization structs keep every field optional and merge
//! over the defaults.

use anyhow::{Context, Result};
use mycel_core::{AlertConfig, TrendConfig};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Opt-in partial scoring for incomplete vectors.
    pub partial_scoring: bool,
    pub trend: TrendConfig,
    pub alerts: AlertConfig,
    pub ensemble: EnsembleConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            partial_scoring: false,
            trend: TrendConfig::default(),
            alerts: AlertConfig::default(),
            ensemble: EnsembleConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnsembleConfig {
    /// Per-sub-model budget; a model that exceeds it counts as failed.
    pub model_timeout_ms: u64,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            model_timeout_ms: 250,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct RawEngineConfig {
    #[serde(default)]
    partial_scoring: Option<bool>,
    #[serde(default)]
    trend: RawTrendConfig,
    #[serde(default)]
    alerts: RawAlertConfig,
    #[serde(default)]
    ensemble: RawEnsembleConfig,
}

#[derive(Debug, Deserialize, Default)]
struct RawTrendConfig {
    #[serde(default)]
    window: Option<usize>,
    #[serde(default)]
    min_points: Option<usize>,
    #[serde(default)]
    horizon_days: Option<f64>,
    #[serde(default)]
    min_confidence: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
struct RawAlertConfig {
    #[serde(default)]
    clear_streak: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct RawEnsembleConfig {
    #[serde(default)]
    model_timeout_ms: Option<u64>,
}

impl From<RawEngineConfig> for EngineConfig {
    fn from(raw: RawEngineConfig) -> Self {
        let defaults = EngineConfig::default();
        Self {
            partial_scoring: raw.partial_scoring.unwrap_or(defaults.partial_scoring),
            trend: TrendConfig {
                window: raw.trend.window.unwrap_or(defaults.trend.window),
                min_points: raw.trend.min_points.unwrap_or(defaults.trend.min_points),
                horizon_days: raw.trend.horizon_days.unwrap_or(defaults.trend.horizon_days),
                min_confidence: raw
                    .trend
                    .min_confidence
                    .unwrap_or(defaults.trend.min_confidence),
            },
            alerts: AlertConfig {
                clear_streak: raw.alerts.clear_streak.unwrap_or(defaults.alerts.clear_streak),
            },
            ensemble: EnsembleConfig {
                model_timeout_ms: raw
                    .ensemble
                    .model_timeout_ms
                    .unwrap_or(defaults.ensemble.model_timeout_ms),
            },
        }
    }
}

impl EngineConfig {
    /// Load from a TOML file, merging over defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let raw: RawEngineConfig = toml::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(raw.into())
    }
}
