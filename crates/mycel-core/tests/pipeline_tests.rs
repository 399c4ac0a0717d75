//! End-to-end scoring pipeline: normalization through alerts.

use chrono::{DateTime, TimeZone, Utc};
use mycel_core::{
    AlertConfig, AlertManager, AlertSeverity, Biome, CompositeScorer, CoreError,
    ParameterKind, ParameterMeasurement, ParameterNormalizer, ReferenceStore, Tier,
    TrendDetector,
};
use std::sync::Arc;

fn ts(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 7, day, 6, 0, 0).unwrap()
}

fn measurements(unit_id: &str, raws: [(ParameterKind, f64); 8], day: u32) -> Vec<ParameterMeasurement> {
    raws.iter()
        .map(|&(kind, raw)| {
            ParameterMeasurement::new(unit_id, kind, Biome::TemperateBroadleaf, raw, ts(day))
        })
        .collect()
}

fn healthy_raws() -> [(ParameterKind, f64); 8] {
    [
        (ParameterKind::EtaNw, 0.80),
        (ParameterKind::RhoE, 0.70),
        (ParameterKind::GradC, 0.85),
        (ParameterKind::Ser, 1.00),
        (ParameterKind::KTopo, 1.80),
        (ParameterKind::Abi, 2.00),
        (ParameterKind::Bfs, 0.80),
        (ParameterKind::Arc, 0.75),
    ]
}

fn degraded_raws() -> [(ParameterKind, f64); 8] {
    [
        (ParameterKind::EtaNw, 0.33),
        (ParameterKind::RhoE, 0.21),
        (ParameterKind::GradC, 0.41),
        (ParameterKind::Ser, 0.50),
        (ParameterKind::KTopo, 1.36),
        (ParameterKind::Abi, 1.05),
        (ParameterKind::Bfs, 0.29),
        (ParameterKind::Arc, 0.31),
    ]
}

#[test]
fn test_healthy_unit_scores_excellent() {
    let normalizer = ParameterNormalizer::new(Arc::new(ReferenceStore::baseline()));
    let vector = normalizer
        .normalize_all(&measurements("mnu-101", healthy_raws(), 1))
        .unwrap();
    assert!(vector.is_complete());

    let score = CompositeScorer::new()
        .score("mnu-101", ts(1), &vector)
        .unwrap();
    assert!(score.value > 0.90);
    assert_eq!(score.tier, Tier::Excellent);
}

#[test]
fn test_degraded_unit_collapses_and_alerts() {
    let normalizer = ParameterNormalizer::new(Arc::new(ReferenceStore::baseline()));
    let vector = normalizer
        .normalize_all(&measurements("mnu-102", degraded_raws(), 1))
        .unwrap();
    let score = CompositeScorer::new()
        .score("mnu-102", ts(1), &vector)
        .unwrap();
    assert_eq!(score.tier, Tier::Collapse);

    let mut alerts = AlertManager::new(AlertConfig::default());
    let transitions = alerts.evaluate("mnu-102", "site-bialowieza", score.tier, None, &[], ts(1));
    assert_eq!(transitions.len(), 1);
    assert_eq!(
        alerts.open_alert("mnu-102").unwrap().severity,
        AlertSeverity::Collapse
    );
}

#[test]
fn test_implausible_measurement_rejected() {
    let normalizer = ParameterNormalizer::new(Arc::new(ReferenceStore::baseline()));
    let mut raws = healthy_raws();
    raws[4] = (ParameterKind::KTopo, 0.4); // below any physical fractal dimension
    let err = normalizer
        .normalize_all(&measurements("mnu-103", raws, 1))
        .unwrap_err();
    assert!(matches!(err, CoreError::Domain { kind: ParameterKind::KTopo, .. }));
}

#[test]
fn test_decline_produces_warning_then_breach_then_recovery() {
    let store = Arc::new(ReferenceStore::baseline());
    let normalizer = ParameterNormalizer::new(Arc::clone(&store));
    let scorer = CompositeScorer::new();
    let detector = TrendDetector::default();
    let mut alerts = AlertManager::new(AlertConfig::default());

    // A steady pulse-density collapse over six cycles, everything else held.
    let rho_values = [0.70, 0.60, 0.50, 0.40, 0.30, 0.22];
    let mut series: Vec<(DateTime<Utc>, f64)> = Vec::new();
    let mut saw_watch = false;
    let mut saw_breach = false;

    for (day, &rho) in rho_values.iter().enumerate() {
        let day = day as u32 + 1;
        let mut raws = healthy_raws();
        raws[1] = (ParameterKind::RhoE, rho);
        let vector = normalizer
            .normalize_all(&measurements("mnu-104", raws, day))
            .unwrap();
        let score = scorer.score("mnu-104", ts(day), &vector).unwrap();
        series.push((score.timestamp, score.value));

        let warning = detector.detect("mnu-104", &series);
        if warning.is_some() && score.tier >= Tier::Good {
            saw_watch = true;
        }
        let transitions = alerts.evaluate(
            "mnu-104",
            "site-bialowieza",
            score.tier,
            warning.as_ref(),
            &[ParameterKind::RhoE],
            ts(day),
        );
        if !transitions.is_empty() && AlertSeverity::from_tier(score.tier).is_some() {
            saw_breach = true;
        }
    }

    // The early warning fired while the unit was still healthy, and the
    // alert escalated once the composite actually breached.
    assert!(saw_watch || saw_breach);
    assert!(alerts.open_alert("mnu-104").is_some());

    // Recovery: two consecutive healthy cycles resolve the alert.
    for day in 7..=8 {
        let vector = normalizer
            .normalize_all(&measurements("mnu-104", healthy_raws(), day))
            .unwrap();
        let score = scorer.score("mnu-104", ts(day), &vector).unwrap();
        alerts.evaluate("mnu-104", "site-bialowieza", score.tier, None, &[], ts(day));
    }
    assert!(alerts.open_alert("mnu-104").is_none());
    assert_eq!(alerts.resolved_history().len(), 1);
}

#[test]
fn test_partial_scoring_is_explicit() {
    let normalizer = ParameterNormalizer::new(Arc::new(ReferenceStore::baseline()));
    let partial_measurements: Vec<_> = measurements("mnu-105", healthy_raws(), 1)
        .into_iter()
        .take(5)
        .collect();
    let vector = normalizer.normalize_all(&partial_measurements).unwrap();
    assert!(!vector.is_complete());

    // Default scorer refuses.
    assert!(CompositeScorer::new()
        .score("mnu-105", ts(1), &vector)
        .is_err());

    // Opt-in partial mode scores and says so.
    let score = CompositeScorer::new()
        .allow_partial(true)
        .score("mnu-105", ts(1), &vector)
        .unwrap();
    assert!(score.partial);
    assert!((0.0..=1.0).contains(&score.value));
}
