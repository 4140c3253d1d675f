use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tsod_core::{Concurrency, Inlier, Outlier, SeriesSet};

use crate::analyzer::{AnalysisContext, Analyzer, AnalyzerOutput};
use crate::scheduler::runner::Orchestrator;

/// Mock analyzer emitting fixed verdicts, optionally after a delay.
struct MockAnalyzer {
    name: String,
    outliers: Vec<i64>,
    inliers: Vec<i64>,
    delay: Duration,
    panics: bool,
    calls: Arc<AtomicUsize>,
}

impl MockAnalyzer {
    fn new(name: &str, outliers: &[i64], inliers: &[i64]) -> Self {
        Self {
            name: name.to_string(),
            outliers: outliers.to_vec(),
            inliers: inliers.to_vec(),
            delay: Duration::ZERO,
            panics: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn panicking(mut self) -> Self {
        self.panics = true;
        self
    }
}

impl Analyzer for MockAnalyzer {
    fn name(&self) -> &str {
        &self.name
    }

    fn analyze(&self, _ctx: &AnalysisContext, _series: &SeriesSet) -> AnalyzerOutput {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        if self.panics {
            panic!("mock analyzer failure");
        }
        let id = self.id();
        AnalyzerOutput {
            outliers: self
                .outliers
                .iter()
                .map(|&ts| Outlier {
                    analyzer: id.clone(),
                    series: "regular".into(),
                    timestamp: ts,
                    value: 100.0,
                    lower_bound: 0.0,
                    upper_bound: 10.0,
                    forecast: Some(5.0),
                    magnitude: 9.0,
                })
                .collect(),
            inliers: self
                .inliers
                .iter()
                .map(|&ts| Inlier {
                    analyzer: id.clone(),
                    series: "regular".into(),
                    timestamp: ts,
                })
                .collect(),
        }
    }
}

fn run(orchestrator: &mut Orchestrator) -> Vec<i64> {
    let ctx = Arc::new(AnalysisContext::new("test", 60));
    let series = Arc::new(SeriesSet::new());
    orchestrator.run(ctx, series).iter().map(|o| o.timestamp).collect()
}

fn parallel() -> Orchestrator {
    Orchestrator::new(Concurrency::Parallel { threads: 0 }, Duration::from_secs(10))
}

#[test]
fn register_analyzer() {
    let mut orchestrator = parallel();
    orchestrator.register_analyzer(Arc::new(MockAnalyzer::new("a", &[1], &[])));
    assert_eq!(orchestrator.analyzers().len(), 1);
    assert_eq!(orchestrator.active_analyzers(), 0);
}

#[test]
fn merges_all_analyzers_in_registration_order() {
    let mut orchestrator = parallel();
    orchestrator.register_analyzer(Arc::new(MockAnalyzer::new("a", &[1, 2], &[3])));
    orchestrator.register_analyzer(Arc::new(MockAnalyzer::new("b", &[3], &[1])));

    let outliers = run(&mut orchestrator);
    assert_eq!(outliers, vec![1, 2, 3]);
    assert_eq!(orchestrator.inliers().len(), 2);

    let summary = orchestrator.summary();
    assert_eq!(summary.dispatched, 2);
    assert_eq!(summary.completed, 2);
    assert_eq!(summary.active, 2);
    assert!(summary.is_complete());
    assert_eq!(orchestrator.metrics().analyzers["a"].outliers, 2);
}

#[test]
fn silent_analyzer_is_not_active() {
    let mut orchestrator = parallel();
    orchestrator.register_analyzer(Arc::new(MockAnalyzer::new("voter", &[], &[1])));
    orchestrator.register_analyzer(Arc::new(MockAnalyzer::new("abstainer", &[], &[])));

    run(&mut orchestrator);
    assert_eq!(orchestrator.summary().completed, 2);
    assert_eq!(orchestrator.active_analyzers(), 1);
    assert!(!orchestrator.metrics().analyzers["abstainer"].active);
}

#[test]
fn sequential_matches_parallel() {
    let build = |concurrency| {
        let mut o = Orchestrator::new(concurrency, Duration::from_secs(10));
        o.register_analyzer(Arc::new(MockAnalyzer::new("a", &[5, 1], &[2])));
        o.register_analyzer(Arc::new(MockAnalyzer::new("b", &[7], &[])));
        o.register_analyzer(Arc::new(MockAnalyzer::new("c", &[], &[])));
        o
    };
    let mut seq = build(Concurrency::Sequential);
    let mut par = build(Concurrency::Parallel { threads: 2 });

    assert_eq!(run(&mut seq), run(&mut par));
    assert_eq!(seq.summary(), par.summary());
    assert_eq!(seq.inliers().len(), par.inliers().len());
}

#[test]
fn deadline_abandons_slow_analyzers() {
    let mut orchestrator = Orchestrator::new(Concurrency::Parallel { threads: 2 }, Duration::from_millis(50));
    orchestrator.register_analyzer(Arc::new(MockAnalyzer::new("fast", &[1], &[])));
    orchestrator.register_analyzer(Arc::new(
        MockAnalyzer::new("slow", &[2], &[]).slow(Duration::from_millis(1500)),
    ));

    let outliers = run(&mut orchestrator);
    assert_eq!(outliers, vec![1]);

    let summary = orchestrator.summary();
    assert!(summary.timed_out);
    assert_eq!(summary.dispatched, 2);
    assert_eq!(summary.completed, 1);
    assert!(!summary.is_complete());
    assert_eq!(orchestrator.metrics().incomplete, vec!["slow".to_string()]);
}

#[test]
fn panicking_analyzer_is_isolated() {
    for concurrency in [Concurrency::Sequential, Concurrency::Parallel { threads: 0 }] {
        let mut orchestrator = Orchestrator::new(concurrency, Duration::from_secs(10));
        orchestrator.register_analyzer(Arc::new(MockAnalyzer::new("broken", &[9], &[]).panicking()));
        orchestrator.register_analyzer(Arc::new(MockAnalyzer::new("ok", &[1], &[])));

        assert_eq!(run(&mut orchestrator), vec![1]);
        let summary = orchestrator.summary();
        assert_eq!(summary.completed, 1);
        assert!(!summary.timed_out);
        assert!(!summary.is_complete());
    }
}

#[test]
fn rerun_resets_previous_findings() {
    let mock = MockAnalyzer::new("a", &[1], &[2]);
    let calls = Arc::clone(&mock.calls);
    let mut orchestrator = parallel();
    orchestrator.register_analyzer(Arc::new(mock));

    run(&mut orchestrator);
    let outliers = run(&mut orchestrator);

    assert_eq!(outliers, vec![1]);
    assert_eq!(orchestrator.inliers().len(), 1);
    assert_eq!(calls.load(Ordering::Relaxed), 2);
    assert_eq!(orchestrator.metrics().analyzers["a"].runs, 2);
}

#[test]
fn no_analyzers_means_no_findings() {
    let mut orchestrator = parallel();
    assert!(run(&mut orchestrator).is_empty());
    let summary = orchestrator.summary();
    assert_eq!(summary.active, 0);
    assert!(summary.is_complete());
}
