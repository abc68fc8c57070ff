//! Corpus evaluation: configuration, per-sample pipeline and aggregation.
//!
//! [`Orchestrator`] walks the corpus and drives each sample through
//! `Loaded -> Analyzed -> Judged -> Scored -> {Passed | Failed}`, recording
//! failures as `Errored` results. [`AggregateReport`] summarizes the run.

pub mod config;
pub mod orchestrator;
pub mod report;
pub mod result;

pub use config::{EvalConfig, DEFAULT_WORKERS};
pub use orchestrator::{run, Orchestrator, SampleOutcome};
pub use report::{AggregateReport, ErrorEntry};
pub use result::{
    EvaluationResult, FailureKind, LoadFailure, SampleFailure, SampleProgress, SampleState,
};
