//! logdetective-eval: evaluation harness for the Log Detective build-log
//! analyzer.
//!
//! Each labeled sample of a corpus is submitted to a running analyzer; an LLM
//! judge rates how similar the produced analysis is to the sample's expected
//! issue on a 1-10 scale, and the scores are aggregated into a pass rate.

pub mod analyzer;
pub mod cli;
pub mod corpus;
pub mod error;
pub mod evaluation;
pub mod llm;
pub mod scoring;

pub use error::{
    AnalyzerError, ConfigError, JudgeError, SampleError, SampleLoadError, ScoreParseError,
};
pub use evaluation::{AggregateReport, EvalConfig, EvaluationResult, Orchestrator};
