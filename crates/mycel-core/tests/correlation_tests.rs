//! Statistical behavior of the correlation analyzer.

use mycel_core::correlation::{correlate, test_association};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[test]
fn test_independent_series_average_near_zero() {
    let mut rng = StdRng::seed_from_u64(42);
    let trials = 40;
    let n = 40;

    let mut abs_r_sum = 0.0;
    let mut p_sum = 0.0;
    for _ in 0..trials {
        let a: Vec<f64> = (0..n).map(|_| rng.gen_range(0.0..1.0)).collect();
        let b: Vec<f64> = (0..n).map(|_| rng.gen_range(0.0..1.0)).collect();
        let assoc = correlate(&a, &b).unwrap();
        abs_r_sum += assoc.coefficient.abs();
        p_sum += assoc.p_value;
    }

    let mean_abs_r = abs_r_sum / trials as f64;
    let mean_p = p_sum / trials as f64;
    assert!(mean_abs_r < 0.25, "mean |r| = {mean_abs_r}");
    assert!(mean_p > 0.20, "mean p = {mean_p}");
}

#[test]
fn test_coupled_series_clear_hypothesis_threshold() {
    // Pulse density tracking topological complexity with mild noise, the
    // shape of the field observation the r > 0.90 hypothesis is about.
    let mut rng = StdRng::seed_from_u64(9);
    let base: Vec<f64> = (0..100).map(|_| rng.gen_range(-1.0..1.0)).collect();
    let rho_e: Vec<f64> = base
        .iter()
        .map(|b| 0.6 + 0.20 * b + 0.02 * rng.gen_range(-1.0..1.0))
        .collect();
    let k_topo: Vec<f64> = base
        .iter()
        .map(|b| 1.6 + 0.20 * b + 0.01 * rng.gen_range(-1.0..1.0))
        .collect();

    let assoc = correlate(&rho_e, &k_topo).unwrap();
    assert!(assoc.coefficient > 0.90, "r = {}", assoc.coefficient);
    assert!(assoc.p_value < 0.001, "p = {}", assoc.p_value);
    assert!(test_association(&rho_e, &k_topo, 0.90, 0.001).unwrap());
}

#[test]
fn test_weak_association_fails_hypothesis_threshold() {
    let mut rng = StdRng::seed_from_u64(11);
    let a: Vec<f64> = (0..60).map(|_| rng.gen_range(0.0..1.0)).collect();
    let b: Vec<f64> = (0..60).map(|_| rng.gen_range(0.0..1.0)).collect();
    assert!(!test_association(&a, &b, 0.90, 0.001).unwrap());
}
