//! End-to-end detection runs: loader → preparation → analyzers → consensus.

use std::f64::consts::PI;

use tsod_compute::{DetectionEngine, TrendRegressionAnalyzer};
use tsod_core::{AlertPolicy, DetectorConfig, InMemoryLoader};

/// Aligned to a 60 second bucket.
const BASE: i64 = 1_700_000_040;
const STEP: i64 = 60;

fn ts(i: usize) -> i64 {
    BASE + i as i64 * STEP
}

/// Deterministic pseudo-noise in [-1, 1).
fn noise(i: usize) -> f64 {
    let x = (i as u64)
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    ((x >> 33) % 2000) as f64 / 1000.0 - 1.0
}

fn sinusoid(n: usize) -> Vec<(i64, f64)> {
    (0..n)
        .map(|i| (ts(i), 1000.0 + 100.0 * (2.0 * PI * i as f64 / 50.0).sin() + 2.0 * noise(i)))
        .collect()
}

// ── Injected spike ──────────────────────────────────────────────────

#[test]
fn spike_on_seasonal_series_is_reported() {
    let mut points = sinusoid(100);
    points[95].1 *= 10.0;
    let loader = InMemoryLoader::default().with_series("regular", points);

    let report = DetectionEngine::run(&loader, DetectorConfig::default()).unwrap();

    assert_eq!(report.resolution, 60);
    assert_eq!(report.summary.dispatched, 3);
    assert!(report.summary.is_complete());
    assert!(report.summary.active >= 1);

    let spike = report
        .outliers
        .iter()
        .find(|v| v.timestamp == ts(95))
        .expect("spike should be reported");
    assert!(spike.score > 1.0);
    assert!(spike
        .details
        .outliers
        .iter()
        .any(|o| o.analyzer.name == TrendRegressionAnalyzer::NAME));
    assert_eq!(spike.details.timeseries_snapshot["regular"].len(), 10);

    // Nothing is ever reported inside the train partition.
    assert!(report.outliers.iter().all(|v| v.timestamp >= ts(90)));
}

// ── Flat series ─────────────────────────────────────────────────────

#[test]
fn plateau_yields_nothing() {
    let points: Vec<(i64, f64)> = (0..100).map(|i| (ts(i), 50.0)).collect();
    let loader = InMemoryLoader::default().with_series("regular", points);

    let mut engine = DetectionEngine::load(&loader, DetectorConfig::default()).unwrap();
    engine.register_default_analyzers();
    assert_eq!(engine.analyze(), 0);

    let validation = engine.validate();
    assert!(validation.outliers.is_empty());
    assert_eq!(engine.orchestrator().active_analyzers(), 3);
    assert_eq!(engine.orchestrator().inliers().len(), 30);
}

// ── Expected errors ─────────────────────────────────────────────────

#[test]
fn expected_errors_are_cross_checked() {
    let mut points = sinusoid(100);
    points[95].1 *= 10.0;
    let loader = InMemoryLoader::default()
        .with_series("regular", points)
        // Unaligned timestamps are bucketed before the cross-check.
        .with_expected_errors(vec![ts(95) + 7, ts(20) + 1]);

    let report = DetectionEngine::run(&loader, DetectorConfig::default()).unwrap();

    assert_eq!(report.missed_expected, vec![ts(20)]);
    assert!(!report.unexpected.contains(&ts(95)));
}

// ── Settings from the loader ────────────────────────────────────────

#[test]
fn loader_settings_drive_the_run() {
    let mut points = sinusoid(100);
    points[95].1 *= 10.0;
    let loader = InMemoryLoader::default()
        .with_series("regular", points.clone())
        .with_setting("threads", "sync")
        .with_setting("snapshot_points", "4")
        .with_setting("name", "sync-run");

    let report = DetectionEngine::run(&loader, DetectorConfig::default()).unwrap();
    assert_eq!(report.name, "sync-run");
    let spike = report.outliers.iter().find(|v| v.timestamp == ts(95)).unwrap();
    assert_eq!(spike.details.timeseries_snapshot["regular"].len(), 4);

    let parallel = DetectionEngine::run(
        &InMemoryLoader::default().with_series("regular", points),
        DetectorConfig::default(),
    )
    .unwrap();
    let stamps = |r: &tsod_compute::DetectionReport| r.outliers.iter().map(|v| v.timestamp).collect::<Vec<_>>();
    assert_eq!(stamps(&report), stamps(&parallel));
}

// ── Error series ────────────────────────────────────────────────────

#[test]
fn error_series_only_alerts_upwards() {
    let regular: Vec<(i64, f64)> = (0..100).map(|i| (ts(i), 1000.0 + 5.0 * noise(i))).collect();
    let mut errors: Vec<(i64, f64)> = (0..100).map(|i| (ts(i), 20.0 + noise(i + 500))).collect();
    errors[93].1 = 0.0;
    errors[96].1 = 400.0;
    let loader = InMemoryLoader::default()
        .with_series("regular", regular)
        .with_series("error", errors);

    let mut engine = DetectionEngine::load(&loader, DetectorConfig::default()).unwrap();
    assert_eq!(engine.series()["error"].alert_policy(), AlertPolicy::over_only());
    assert_eq!(engine.series()["error_rate"].alert_policy(), AlertPolicy::over_only());

    engine.register_default_analyzers();
    engine.analyze();
    let error_outliers: Vec<i64> = engine
        .orchestrator()
        .outliers()
        .iter()
        .filter(|o| o.series == "error")
        .map(|o| o.timestamp)
        .collect();
    assert!(error_outliers.contains(&ts(96)));
    assert!(!error_outliers.contains(&ts(93)));
}

#[test]
fn report_serializes() {
    let loader = InMemoryLoader::default().with_series("regular", sinusoid(60));
    let report = DetectionEngine::run(&loader, DetectorConfig::default()).unwrap();
    let doc = serde_json::to_value(&report).unwrap();
    assert_eq!(doc["resolution"], 60);
    assert_eq!(doc["series"][0]["name"], "regular");
    assert!(doc["outliers"].is_array());
}
