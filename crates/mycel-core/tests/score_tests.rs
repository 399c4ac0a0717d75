//! Golden tests for the composite score formula.

use approx::assert_relative_eq;
use chrono::{TimeZone, Utc};
use mycel_core::{CompositeScorer, NormalizedVector, ParameterKind, Tier};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn ts() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 2, 6, 0, 0).unwrap()
}

/// The reference vector from the survey documentation.
fn reference_vector() -> NormalizedVector {
    NormalizedVector::new()
        .with(ParameterKind::EtaNw, 0.71)
        .with(ParameterKind::RhoE, 0.81)
        .with(ParameterKind::GradC, 0.91)
        .with(ParameterKind::Ser, 0.87)
        .with(ParameterKind::KTopo, 0.68)
        .with(ParameterKind::Abi, 0.84)
        .with(ParameterKind::Bfs, 0.73)
        .with(ParameterKind::Arc, 0.69)
}

#[test]
fn test_reference_vector_linear_term() {
    let scorer = CompositeScorer::new();
    let score = scorer.score("mnu-ref", ts(), &reference_vector()).unwrap();
    // 0.20·0.71 + 0.20·0.81 + 0.15·0.91 + 0.15·0.87 + 0.12·0.68
    //   + 0.08·0.84 + 0.05·0.73 + 0.05·0.69 = 0.7908
    assert_relative_eq!(score.linear, 0.7908, epsilon = 1e-9);
}

#[test]
fn test_reference_vector_sigmoid_value() {
    let scorer = CompositeScorer::new();
    let score = scorer.score("mnu-ref", ts(), &reference_vector()).unwrap();
    // σ(6·0.7908 − 3) = σ(1.7448)
    assert_relative_eq!(score.value, 0.8513, epsilon = 1e-3);
    assert_eq!(score.tier, Tier::Excellent);
    assert!(!score.partial);
}

#[test]
fn test_value_bounded_for_random_vectors() {
    let scorer = CompositeScorer::new();
    let mut rng = StdRng::seed_from_u64(7);
    for trial in 0..200 {
        let mut vector = NormalizedVector::new();
        for kind in ParameterKind::ALL {
            vector.set(kind, rng.gen_range(0.0..=1.0));
        }
        let score = scorer
            .score(&format!("mnu-{trial}"), ts(), &vector)
            .unwrap();
        assert!((0.0..=1.0).contains(&score.value));
        assert!((0.0..=1.0).contains(&score.linear));
    }
}

#[test]
fn test_score_is_monotonic_in_each_parameter() {
    let scorer = CompositeScorer::new();
    for kind in ParameterKind::ALL {
        let mut low = reference_vector();
        low.set(kind, 0.2);
        let mut high = reference_vector();
        high.set(kind, 0.8);
        let low_score = scorer.score("mnu-ref", ts(), &low).unwrap();
        let high_score = scorer.score("mnu-ref", ts(), &high).unwrap();
        assert!(
            high_score.value > low_score.value,
            "composite not monotonic in {kind}"
        );
    }
}

#[test]
fn test_identical_inputs_identical_outputs_across_instances() {
    let a = CompositeScorer::new()
        .score("mnu-ref", ts(), &reference_vector())
        .unwrap();
    let b = CompositeScorer::new()
        .score("mnu-ref", ts(), &reference_vector())
        .unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_composite_score_serde_round_trip() {
    let score = CompositeScorer::new()
        .score("mnu-ref", ts(), &reference_vector())
        .unwrap();
    let json = serde_json::to_string(&score).unwrap();
    let parsed: mycel_core::CompositeScore = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, score);
}
