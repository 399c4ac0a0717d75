//! Parameter normalization against biome references.
//!
//! Maps a raw measurement to [0, 1]. Values outside the kind's plausible
//! domain are rejected with a domain error; values beyond the reference
//! range but inside the plausible domain saturate at 0 or 1 (reference
//! saturation, flagged downstream as a boundary warning).

use crate::biome::Biome;
use crate::error::CoreError;
use crate::measurement::{NormalizedVector, ParameterMeasurement};
use crate::parameter::{NormalizationShape, ParameterKind};
use crate::reference::ReferenceStore;
use std::sync::Arc;

/// Fallback optimal band for two-sided kinds whose calibration entry
/// carries no band.
const DEFAULT_OPTIMAL_BAND: (f64, f64) = (0.90, 1.10);

#[derive(Debug, Clone)]
pub struct ParameterNormalizer {
    store: Arc<ReferenceStore>,
}

impl ParameterNormalizer {
    pub fn new(store: Arc<ReferenceStore>) -> Self {
        Self { store }
    }

    /// Normalize one raw value. Monotonic in `raw` for positively-oriented
    /// kinds; two-sided kinds peak at 1.0 inside the biome's optimal band
    /// and decay linearly to 0 at both reference-range edges.
    pub fn normalize(
        &self,
        raw: f64,
        kind: ParameterKind,
        biome: Biome,
    ) -> Result<f64, CoreError> {
        let (lo, hi) = kind.plausible_domain();
        if !raw.is_finite() || raw < lo || raw > hi {
            return Err(CoreError::Domain {
                kind,
                value: raw,
                lo,
                hi,
            });
        }

        let reference = self.store.lookup(biome, kind)?;

        let value = match kind.shape() {
            NormalizationShape::Positive => {
                if reference.width() <= 0.0 {
                    0.5
                } else {
                    ((raw - reference.lower) / reference.width()).clamp(0.0, 1.0)
                }
            }
            NormalizationShape::TwoSided => {
                let (band_lo, band_hi) = reference.optimal_band.unwrap_or(DEFAULT_OPTIMAL_BAND);
                if raw >= band_lo && raw <= band_hi {
                    1.0
                } else if raw < band_lo {
                    ((raw - reference.lower) / (band_lo - reference.lower)).max(0.0)
                } else {
                    (1.0 - (raw - band_hi) / (reference.upper - band_hi)).max(0.0)
                }
            }
        };

        Ok(value)
    }

    /// Normalize a single measurement record.
    pub fn normalize_measurement(&self, m: &ParameterMeasurement) -> Result<f64, CoreError> {
        self.normalize(m.raw_value, m.kind, m.biome)
    }

    /// Normalize a batch of measurements for one unit into a vector.
    /// The first invalid measurement fails the whole vector; batch-level
    /// isolation of failures is the engine's job.
    pub fn normalize_all(
        &self,
        measurements: &[ParameterMeasurement],
    ) -> Result<NormalizedVector, CoreError> {
        let mut vector = NormalizedVector::new();
        for m in measurements {
            vector.set(m.kind, self.normalize_measurement(m)?);
        }
        Ok(vector)
    }
}
