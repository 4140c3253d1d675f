use tsod_core::AnalyzerId;

use super::*;
use crate::analyzer::test_support::{series, single};

fn analyzer(name: &str, outlier_weight: f64, inlier_weight: f64) -> AnalyzerId {
    AnalyzerId {
        name: name.into(),
        outlier_weight,
        inlier_weight,
    }
}

fn outlier(id: &AnalyzerId, ts: i64, magnitude: f64) -> Outlier {
    Outlier {
        analyzer: id.clone(),
        series: "regular".into(),
        timestamp: ts,
        value: 10.0,
        lower_bound: 0.0,
        upper_bound: 5.0,
        forecast: Some(2.5),
        magnitude,
    }
}

fn inlier(id: &AnalyzerId, ts: i64) -> Inlier {
    Inlier {
        analyzer: id.clone(),
        series: "regular".into(),
        timestamp: ts,
    }
}

fn empty_set() -> SeriesSet {
    SeriesSet::new()
}

#[test]
fn two_outlier_votes_are_reported() {
    let a = analyzer("a", 1.0, 0.5);
    let b = analyzer("b", 1.0, 0.5);
    let outliers = vec![outlier(&a, 100, 0.0), outlier(&b, 100, 0.0)];
    let set = empty_set();

    let validated = ConsensusValidator::new(&outliers, &[], &set).validate(DEFAULT_MIN_SCORE);
    assert_eq!(validated.len(), 1);
    assert_eq!(validated[0].score, 2.0);
    assert_eq!(validated[0].details.outliers.len(), 2);
}

#[test]
fn light_inlier_still_reported() {
    let a = analyzer("a", 1.0, 0.5);
    let b = analyzer("b", 1.0, 0.5);
    let c = analyzer("c", 1.0, 0.5);
    let outliers = vec![outlier(&a, 100, 0.0), outlier(&b, 100, 0.0)];
    let inliers = vec![inlier(&c, 100)];
    let set = empty_set();

    let validated = ConsensusValidator::new(&outliers, &inliers, &set).validate(DEFAULT_MIN_SCORE);
    assert_eq!(validated.len(), 1);
    assert_eq!(validated[0].score, 1.5);
}

#[test]
fn heavy_inlier_suppresses() {
    let a = analyzer("a", 1.0, 0.5);
    let b = analyzer("b", 1.0, 0.5);
    let c = analyzer("c", 1.0, 2.5);
    let outliers = vec![outlier(&a, 100, 0.0), outlier(&b, 100, 0.0)];
    let inliers = vec![inlier(&c, 100)];
    let set = empty_set();

    assert!(ConsensusValidator::new(&outliers, &inliers, &set)
        .validate(DEFAULT_MIN_SCORE)
        .is_empty());
    assert_eq!(score(&outliers, &inliers)[&100], -0.5);
}

#[test]
fn magnitude_adds_to_score() {
    let a = analyzer("a", 1.0, 0.5);
    let b = analyzer("b", 1.0, 0.5);
    let outliers = vec![outlier(&a, 100, 3.0)];
    let inliers = vec![inlier(&b, 100), inlier(&b, 200)];

    let scores = score(&outliers, &inliers);
    assert_eq!(scores[&100], 3.5);
    assert_eq!(scores[&200], -0.5);
}

#[test]
fn attaches_only_outliers_of_the_timestamp_and_snapshot() {
    let a = analyzer("a", 1.0, 0.5);
    let outliers = vec![outlier(&a, 100, 1.0), outlier(&a, 200, 1.0)];
    let values: Vec<f64> = (0..20).map(|i| i as f64).collect();
    let set = single(series("regular", 5, &values));

    let validated = ConsensusValidator::new(&outliers, &[], &set)
        .with_snapshot_points(3)
        .validate(1.0);
    assert_eq!(validated.len(), 2);
    assert_eq!(validated[0].timestamp, 100);
    assert_eq!(validated[0].details.outliers.len(), 1);
    assert_eq!(validated[0].details.timeseries_snapshot["regular"], vec![17.0, 18.0, 19.0]);
}

#[test]
fn cross_check_reports_misses_and_unexpected() {
    let a = analyzer("a", 1.0, 0.5);
    let b = analyzer("b", 1.0, 3.0);
    // 300 has a raw outlier but is suppressed by consensus
    let outliers = vec![outlier(&a, 100, 1.0), outlier(&a, 300, 0.0)];
    let inliers = vec![inlier(&b, 300)];
    let set = empty_set();

    let validation = ConsensusValidator::new(&outliers, &inliers, &set).validate_against(1.0, &[200, 300]);
    assert_eq!(validation.outliers.len(), 1);
    assert_eq!(validation.cross_check.missed, vec![200]);
    assert_eq!(validation.cross_check.unexpected, vec![100]);
}

#[test]
fn serializes_flat_document() {
    let a = analyzer("a", 1.0, 0.5);
    let outliers = vec![outlier(&a, 100, 1.0)];
    let set = single(series("regular", 5, &[1.0; 20]));
    let validated = ConsensusValidator::new(&outliers, &[], &set).validate(1.0);

    let doc = serde_json::to_value(&validated[0]).unwrap();
    assert_eq!(doc["timestamp"], 100);
    assert_eq!(doc["score"], 2.0);
    assert_eq!(doc["outliers"][0]["analyzer"]["name"], "a");
    assert_eq!(doc["timeseries_snapshot"]["regular"].as_array().unwrap().len(), 10);
}
