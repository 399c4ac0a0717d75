//! Early-warning trend detection over score series.
//!
//! Fits a least-squares line over a sliding window of recent observations
//! and projects forward; when the projection crosses into a worse tier
//! within the horizon with enough confidence, an early warning is emitted.
//! Stateless: re-evaluated fresh on every new observation.

use crate::tier::Tier;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendConfig {
    /// Maximum observations in the fit window.
    pub window: usize,
    /// Below this many observations the detector stays silent.
    pub min_points: usize,
    /// Projection horizon in days.
    pub horizon_days: f64,
    /// Minimum fit confidence (R²) to emit a warning.
    pub min_confidence: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            // Sized to span the 42-day lead-time target at daily cadence.
            window: 42,
            min_points: 4,
            horizon_days: 42.0,
            min_confidence: 0.60,
        }
    }
}

/// Forward-looking signal predicting a tier crossing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarlyWarning {
    pub unit_id: String,
    pub predicted_tier: Tier,
    pub predicted_crossing: DateTime<Utc>,
    /// R² of the window fit, in [0, 1].
    pub confidence: f64,
    pub slope_per_day: f64,
}

#[derive(Debug, Clone, Default)]
pub struct TrendDetector {
    config: TrendConfig,
}

impl TrendDetector {
    pub fn new(config: TrendConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrendConfig {
        &self.config
    }

    /// Evaluate a time-ordered series. Returns `None` when there is no
    /// signal: short history, improving or flat trajectory, low-confidence
    /// fit, crossing beyond the horizon, or a unit already collapsed.
    pub fn detect(
        &self,
        unit_id: &str,
        series: &[(DateTime<Utc>, f64)],
    ) -> Option<EarlyWarning> {
        if series.len() < self.config.min_points {
            return None;
        }

        let start = series.len().saturating_sub(self.config.window);
        let window = &series[start..];

        let t0 = window[0].0;
        let xs: Vec<f64> = window
            .iter()
            .map(|(ts, _)| (*ts - t0).num_seconds() as f64 / 86_400.0)
            .collect();
        let ys: Vec<f64> = window.iter().map(|(_, v)| *v).collect();

        let (slope, intercept, r_squared) = linear_fit(&xs, &ys)?;
        if slope >= 0.0 {
            return None;
        }
        if r_squared < self.config.min_confidence {
            return None;
        }

        let (last_x, last_value) = (*xs.last()?, *ys.last()?);
        // A tier's floor is the next-worse tier's ceiling; an already
        // collapsed unit has nothing left to cross into.
        let worse_tier = Tier::from_score(last_value).worse()?;
        let boundary = worse_tier.ceiling();

        // First crossing of the next-worse boundary along the fitted line.
        let crossing_x = (boundary - intercept) / slope;
        let days_ahead = crossing_x - last_x;
        if days_ahead <= 0.0 || days_ahead > self.config.horizon_days {
            return None;
        }

        let predicted_crossing =
            window.last()?.0 + Duration::seconds((days_ahead * 86_400.0) as i64);

        Some(EarlyWarning {
            unit_id: unit_id.to_string(),
            predicted_tier: worse_tier,
            predicted_crossing,
            confidence: r_squared,
            slope_per_day: slope,
        })
    }
}

/// Least-squares fit returning (slope, intercept, R²). `None` when x has
/// no spread (all observations share a timestamp).
fn linear_fit(xs: &[f64], ys: &[f64]) -> Option<(f64, f64, f64)> {
    let n = xs.len() as f64;
    let x_mean = xs.iter().sum::<f64>() / n;
    let y_mean = ys.iter().sum::<f64>() / n;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    let mut syy = 0.0;
    for (x, y) in xs.iter().zip(ys.iter()) {
        let dx = x - x_mean;
        let dy = y - y_mean;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }
    if sxx == 0.0 {
        return None;
    }

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;
    let r_squared = if syy == 0.0 {
        // Perfectly flat series: the fit explains everything and the
        // slope is zero, which the caller filters out anyway.
        1.0
    } else {
        (sxy * sxy) / (sxx * syy)
    };

    Some((slope, intercept, r_squared))
}
