//! Error types for logdetective-eval.
//!
//! Defines the error taxonomy of an evaluation run:
//! - Sample loading (skip the sample, keep going)
//! - Analyzer and judge endpoint failures (record the sample as errored)
//! - Score extraction from free-text verdicts
//! - Configuration (fatal, aborts before any sample is processed)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while loading a sample from the corpus.
#[derive(Debug, Error)]
pub enum SampleLoadError {
    #[error("Sample '{sample_id}': cannot read metadata file '{path}': {reason}")]
    MetadataUnreadable {
        sample_id: String,
        path: PathBuf,
        reason: String,
    },

    #[error("Sample '{sample_id}': invalid metadata: {reason}")]
    InvalidMetadata { sample_id: String, reason: String },

    #[error("Sample '{sample_id}': required field '{field}' is missing or empty")]
    MissingField {
        sample_id: String,
        field: &'static str,
    },

    #[error("Sample '{sample_id}': log file '{path}' unusable: {reason}")]
    LogFileError {
        sample_id: String,
        path: PathBuf,
        reason: String,
    },
}

impl SampleLoadError {
    /// Identifier of the sample that failed to load.
    pub fn sample_id(&self) -> &str {
        match self {
            Self::MetadataUnreadable { sample_id, .. }
            | Self::InvalidMetadata { sample_id, .. }
            | Self::MissingField { sample_id, .. }
            | Self::LogFileError { sample_id, .. } => sample_id,
        }
    }
}

/// Errors reported by the analyzer client. Every variant means the analyzer
/// was unavailable for this sample.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("Analyzer returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Analyzer request failed: {0}")]
    Transport(String),

    #[error("Analyzer did not respond within {0:?}")]
    Timeout(Duration),

    #[error("Analyzer returned an empty analysis")]
    EmptyResponse,

    #[error("Analyzer response malformed: {0}")]
    MalformedResponse(String),
}

/// Errors that can occur while calling the judge model.
#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Judge did not respond within {0:?}")]
    Timeout(Duration),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("API error ({code}): {message}")]
    ApiError { code: u16, message: String },

    #[error("Failed to parse judge response: {0}")]
    ParseError(String),

    #[error("Judge returned no verdict text")]
    EmptyResponse,
}

/// Errors that can occur while extracting a score from a judge verdict.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScoreParseError {
    #[error("No similarity score found in verdict")]
    NoScore,

    #[error("Similarity score {0} is outside the 1-10 scale")]
    OutOfRange(u32),

    #[error("Verdict mentions conflicting scores: {0:?}")]
    Conflicting(Vec<u32>),
}

/// Fatal configuration errors. These abort the run before any sample is
/// processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing judge credential: set OPENAI_API_KEY or pass --api-key")]
    MissingCredential,

    #[error("Corpus directory not found: {0}")]
    CorpusNotFound(PathBuf),

    #[error("Corpus path is not a directory: {0}")]
    CorpusNotDirectory(PathBuf),

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Per-sample failure caught at the orchestrator boundary.
#[derive(Debug, Error)]
pub enum SampleError {
    #[error(transparent)]
    SampleLoad(#[from] SampleLoadError),

    #[error("Analyzer unavailable: {0}")]
    AnalyzerUnavailable(#[from] AnalyzerError),

    #[error("Judge unavailable: {0}")]
    JudgeUnavailable(#[from] JudgeError),

    #[error("Score parse error: {0}")]
    ScoreParse(#[from] ScoreParseError),
}
