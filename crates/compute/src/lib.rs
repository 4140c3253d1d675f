pub mod analyzer;
pub mod consensus;
pub mod engine;
pub mod pipeline;
pub mod scheduler;

pub use analyzer::{
    AnalysisContext, Analyzer, AnalyzerOutput, MovingAverageAnalyzer, RandomWalkAnalyzer, ToleranceBand,
    TrendRegressionAnalyzer,
};
pub use consensus::{ConsensusValidator, CrossCheck, Validation};
pub use engine::{default_analyzers, DetectionEngine, DetectionReport, SeriesSummary};
pub use pipeline::{prepare, PreparedData};
pub use scheduler::{AnalyzerMetrics, AnalyzerReport, Orchestrator, RunMetrics, RunSummary};
