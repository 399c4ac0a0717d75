//! Ordinal severity tiers over the composite index.
//!
//! Polarity: higher composite value = healthier, matching the index
//! formula (weights over health-oriented normalized parameters). Tier
//! boundaries are the published distress thresholds mirrored through 1−x.
//! Intervals are open at the lower end and closed at the upper end; the
//! bottom tier is closed on both ends, so [0, 1] partitions exactly.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Composite values at or below this are collapsed.
pub const COLLAPSE_CEILING: f64 = 0.20;
pub const CRITICAL_CEILING: f64 = 0.38;
pub const MODERATE_CEILING: f64 = 0.56;
pub const GOOD_CEILING: f64 = 0.75;

/// Severity tier, ordered worst to best so `Ord` follows health.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    Collapse,
    Critical,
    Moderate,
    Good,
    Excellent,
}

impl Tier {
    pub const ALL: [Tier; 5] = [
        Tier::Collapse,
        Tier::Critical,
        Tier::Moderate,
        Tier::Good,
        Tier::Excellent,
    ];

    /// Classify a composite value. Total over [0, 1]; out-of-range input
    /// saturates into the end tiers.
    pub fn from_score(value: f64) -> Tier {
        if value > GOOD_CEILING {
            Tier::Excellent
        } else if value > MODERATE_CEILING {
            Tier::Good
        } else if value > CRITICAL_CEILING {
            Tier::Moderate
        } else if value > COLLAPSE_CEILING {
            Tier::Critical
        } else {
            Tier::Collapse
        }
    }

    /// Upper bound of this tier's value interval (inclusive).
    pub fn ceiling(&self) -> f64 {
        match self {
            Tier::Collapse => COLLAPSE_CEILING,
            Tier::Critical => CRITICAL_CEILING,
            Tier::Moderate => MODERATE_CEILING,
            Tier::Good => GOOD_CEILING,
            Tier::Excellent => 1.0,
        }
    }

    /// The next worse tier, if any.
    pub fn worse(&self) -> Option<Tier> {
        match self {
            Tier::Collapse => None,
            Tier::Critical => Some(Tier::Collapse),
            Tier::Moderate => Some(Tier::Critical),
            Tier::Good => Some(Tier::Moderate),
            Tier::Excellent => Some(Tier::Good),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tier::Collapse => "COLLAPSE",
            Tier::Critical => "CRITICAL",
            Tier::Moderate => "MODERATE",
            Tier::Good => "GOOD",
            Tier::Excellent => "EXCELLENT",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
