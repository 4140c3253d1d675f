//! Analyzer orchestration with a bounded worker pool and a global deadline.
//!
//! The [`Orchestrator`] dispatches every registered [`Analyzer`] against a
//! shared, read-only series set, collects their findings on a single
//! coordinating thread and tracks which analyzers produced a verdict.
//! Analyzers that miss the deadline are abandoned; their late results are
//! discarded and the run is reported as incomplete.
//!
//! [`Analyzer`]: crate::analyzer::Analyzer

pub mod metrics;
pub mod runner;
pub mod types;

pub use metrics::{AnalyzerMetrics, RunMetrics};
pub use runner::Orchestrator;
pub use types::{AnalyzerReport, RunSummary};
