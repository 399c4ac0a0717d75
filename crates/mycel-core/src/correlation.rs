//! Pairwise association tests for parameter validation.
//!
//! Pearson coefficient plus a two-sided significance estimate from the
//! Student t distribution (n−2 degrees of freedom), so hypothesis checks
//! like "r > 0.90 and p < 0.001" can be applied downstream.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Minimum paired observations for a significance estimate (df = n−2 ≥ 1).
pub const MIN_SERIES_LEN: usize = 3;

/// Association strength and significance for one parameter pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Association {
    pub coefficient: f64,
    pub p_value: f64,
    pub n: usize,
}

/// Pearson correlation with two-sided p-value.
pub fn correlate(a: &[f64], b: &[f64]) -> Result<Association, CoreError> {
    if a.len() != b.len() {
        return Err(CoreError::SeriesLengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    if a.len() < MIN_SERIES_LEN {
        return Err(CoreError::SeriesTooShort {
            len: a.len(),
            min: MIN_SERIES_LEN,
        });
    }

    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    if var_a == 0.0 || var_b == 0.0 {
        return Err(CoreError::DegenerateSeries);
    }

    let r = (cov / (var_a.sqrt() * var_b.sqrt())).clamp(-1.0, 1.0);
    let df = n - 2.0;
    let denom = 1.0 - r * r;
    let p_value = if denom <= f64::EPSILON {
        0.0
    } else {
        let t = r.abs() * (df / denom).sqrt();
        // Two-sided tail of Student t: I_{df/(df+t²)}(df/2, 1/2).
        incomplete_beta(df / 2.0, 0.5, df / (df + t * t))
    };

    Ok(Association {
        coefficient: r,
        p_value,
        n: a.len(),
    })
}

/// Hypothesis helper: does the pair clear both thresholds?
pub fn test_association(
    a: &[f64],
    b: &[f64],
    min_r: f64,
    max_p: f64,
) -> Result<bool, CoreError> {
    let assoc = correlate(a, b)?;
    Ok(assoc.coefficient.abs() >= min_r && assoc.p_value <= max_p)
}

/// Full correlation matrix across named series. All series must be paired
/// (equal length) and non-degenerate.
pub fn correlation_matrix(
    series: &BTreeMap<String, Vec<f64>>,
) -> Result<BTreeMap<String, BTreeMap<String, f64>>, CoreError> {
    let mut matrix = BTreeMap::new();
    for (name_a, values_a) in series {
        let mut row = BTreeMap::new();
        for (name_b, values_b) in series {
            let r = if name_a == name_b {
                1.0
            } else {
                correlate(values_a, values_b)?.coefficient
            };
            row.insert(name_b.clone(), r);
        }
        matrix.insert(name_a.clone(), row);
    }
    Ok(matrix)
}

/// Outlier detection method for pre-screening series before correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlierMethod {
    Iqr,
    ZScore,
}

/// Indices of outlying values. Series shorter than 4 points yield none.
pub fn detect_outliers(data: &[f64], method: OutlierMethod, threshold: f64) -> Vec<usize> {
    if data.len() < 4 {
        return Vec::new();
    }
    match method {
        OutlierMethod::Iqr => {
            let q1 = percentile(data, 25.0);
            let q3 = percentile(data, 75.0);
            let iqr = q3 - q1;
            let lower = q1 - threshold * iqr;
            let upper = q3 + threshold * iqr;
            data.iter()
                .enumerate()
                .filter(|(_, &v)| v < lower || v > upper)
                .map(|(i, _)| i)
                .collect()
        }
        OutlierMethod::ZScore => {
            let n = data.len() as f64;
            let mean = data.iter().sum::<f64>() / n;
            let var = data.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            let std = var.sqrt();
            if std == 0.0 {
                return Vec::new();
            }
            data.iter()
                .enumerate()
                .filter(|(_, &v)| ((v - mean) / std).abs() > threshold)
                .map(|(i, _)| i)
                .collect()
        }
    }
}

/// Linear-interpolated percentile (p in [0, 100]).
fn percentile(data: &[f64], p: f64) -> f64 {
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = rank - lo as f64;
        sorted[lo] + frac * (sorted[hi] - sorted[lo])
    }
}

// Regularized incomplete beta via the Lentz continued fraction. The pack
// carries no statistics crate, so the t-tail is evaluated in-crate.

fn ln_gamma(x: f64) -> f64 {
    const COF: [f64; 6] = [
        76.180_091_729_471_46,
        -86.505_320_329_416_77,
        24.014_098_240_830_91,
        -1.231_739_572_450_155,
        0.120_865_097_386_617_9e-2,
        -0.539_523_938_495_3e-5,
    ];
    let mut y = x;
    let tmp = x + 5.5;
    let tmp = tmp - (x + 0.5) * tmp.ln();
    let mut ser = 1.000_000_000_190_015;
    for c in COF {
        y += 1.0;
        ser += c / y;
    }
    -tmp + (2.506_628_274_631_000_5 * ser / x).ln()
}

fn beta_continued_fraction(a: f64, b: f64, x: f64) -> f64 {
    const MAX_ITER: usize = 300;
    const EPS: f64 = 1e-14;
    const FPMIN: f64 = 1e-300;

    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;
    let mut c = 1.0;
    let mut d = 1.0 - qab * x / qap;
    if d.abs() < FPMIN {
        d = FPMIN;
    }
    d = 1.0 / d;
    let mut h = d;

    for m in 1..=MAX_ITER {
        let m = m as f64;
        let m2 = 2.0 * m;

        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 + aa * d;
        if d.abs() < FPMIN {
            d = FPMIN;
        }
        c = 1.0 + aa / c;
        if c.abs() < FPMIN {
            c = FPMIN;
        }
        d = 1.0 / d;
        h *= d * c;

        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 + aa * d;
        if d.abs() < FPMIN {
            d = FPMIN;
        }
        c = 1.0 + aa / c;
        if c.abs() < FPMIN {
            c = FPMIN;
        }
        d = 1.0 / d;
        let del = d * c;
        h *= del;

        if (del - 1.0).abs() < EPS {
            break;
        }
    }
    h
}

fn incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    let ln_bt = ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln();
    let bt = ln_bt.exp();
    if x < (a + 1.0) / (a + b + 2.0) {
        bt * beta_continued_fraction(a, b, x) / a
    } else {
        1.0 - bt * beta_continued_fraction(b, a, 1.0 - x) / b
    }
}
