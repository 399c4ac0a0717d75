//! Distribution summaries over score sets.

use crate::score::CompositeScore;
use crate::tier::Tier;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Summary statistics for a set of composite scores, typically one
/// reporting cycle across a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub tier_counts: BTreeMap<Tier, usize>,
}

/// Summarize a score set. `None` for an empty set.
pub fn summarize(scores: &[CompositeScore]) -> Option<ScoreSummary> {
    if scores.is_empty() {
        return None;
    }

    let n = scores.len() as f64;
    let values: Vec<f64> = scores.iter().map(|s| s.value).collect();
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    let mut sorted = values.clone();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    };

    let mut tier_counts = BTreeMap::new();
    for tier in Tier::ALL {
        tier_counts.insert(tier, 0);
    }
    for score in scores {
        *tier_counts.entry(score.tier).or_insert(0) += 1;
    }

    Some(ScoreSummary {
        count: scores.len(),
        mean,
        std_dev: var.sqrt(),
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        median,
        tier_counts,
    })
}
