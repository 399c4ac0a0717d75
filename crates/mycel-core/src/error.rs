//! Error types for the scoring core.
//!
//! Nothing here is fatal to a batch: per-unit failures are captured and
//! reported alongside successful results by the engine layer.

use crate::biome::Biome;
use crate::parameter::ParameterKind;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Raw value outside the kind's physically plausible domain. Rejected,
    /// never clamped: clamping would silently hide sensor faults.
    #[error("{kind} value {value} outside plausible domain [{lo}, {hi}]")]
    Domain {
        kind: ParameterKind,
        value: f64,
        lo: f64,
        hi: f64,
    },

    /// No calibration for this (biome, parameter) pair. Fatal for the
    /// computation, not retried.
    #[error("no reference distribution for {kind} in biome {biome}")]
    ReferenceMissing { biome: Biome, kind: ParameterKind },

    /// A complete score was requested from a partial vector.
    #[error("normalized vector incomplete: missing {}", format_kinds(.missing))]
    IncompleteVector { missing: Vec<ParameterKind> },

    /// Zero-variance input: correlation is undefined.
    #[error("series has zero variance, correlation undefined")]
    DegenerateSeries,

    /// Paired series must have equal length.
    #[error("paired series differ in length ({left} vs {right})")]
    SeriesLengthMismatch { left: usize, right: usize },

    /// Too few paired observations for a significance estimate.
    #[error("need at least {min} paired observations, got {len}")]
    SeriesTooShort { len: usize, min: usize },

    /// Every ensemble sub-model failed; no combined estimate exists.
    #[error("all ensemble sub-models failed")]
    EnsembleExhausted,
}

/// Failure of a single ensemble sub-model. Isolated by the combiner:
/// degrades the estimate instead of propagating.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("{model}: required input missing: {input}")]
    MissingInput {
        model: &'static str,
        input: &'static str,
    },

    #[error("{model}: {reason}")]
    Failed { model: &'static str, reason: String },

    #[error("{model}: timed out after {ms}ms")]
    TimedOut { model: &'static str, ms: u64 },
}

fn format_kinds(kinds: &[ParameterKind]) -> String {
    kinds
        .iter()
        .map(|k| k.symbol())
        .collect::<Vec<_>>()
        .join(", ")
}
