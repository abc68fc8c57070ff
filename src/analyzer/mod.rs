//! Client for the log analyzer under evaluation.

pub mod client;

pub use client::{
    parse_analysis, AnalysisRequest, AnalyzerClient, AnalyzerConfig, LogAnalyzer,
    SubmissionMode, DEFAULT_ANALYZER_PATH, DEFAULT_ANALYZER_TIMEOUT, DEFAULT_LOG_BASE_URL,
};
