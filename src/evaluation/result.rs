//! Per-sample evaluation results.

use serde::{Deserialize, Serialize};

use crate::error::{SampleError, SampleLoadError};
use crate::scoring::{passes_threshold, SimilarityScore};

/// Lifecycle of one sample.
///
/// `Loaded -> Analyzed -> Judged -> Scored -> {Passed | Failed}`, with an
/// early exit to `Errored` from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleState {
    Loaded,
    Analyzed,
    Judged,
    Scored,
    Passed,
    Failed,
    Errored,
}

impl SampleState {
    /// Whether no further transition can happen.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Passed | Self::Failed | Self::Errored)
    }
}

/// Category of a per-sample failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    SampleLoad,
    AnalyzerUnavailable,
    JudgeUnavailable,
    ScoreParse,
}

impl FailureKind {
    /// Short human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::SampleLoad => "sample load error",
            Self::AnalyzerUnavailable => "analyzer unavailable",
            Self::JudgeUnavailable => "judge unavailable",
            Self::ScoreParse => "score parse error",
        }
    }
}

impl From<&SampleError> for FailureKind {
    fn from(error: &SampleError) -> Self {
        match error {
            SampleError::SampleLoad(_) => Self::SampleLoad,
            SampleError::AnalyzerUnavailable(_) => Self::AnalyzerUnavailable,
            SampleError::JudgeUnavailable(_) => Self::JudgeUnavailable,
            SampleError::ScoreParse(_) => Self::ScoreParse,
        }
    }
}

/// Why a sample ended in `Errored`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleFailure {
    pub kind: FailureKind,
    /// Last state reached before the failure.
    pub stage: SampleState,
    pub message: String,
}

/// A sample that was excluded before dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadFailure {
    pub sample_id: String,
    /// Missing required field, for `MissingField` errors.
    pub field: Option<String>,
    pub message: String,
}

impl From<&SampleLoadError> for LoadFailure {
    fn from(error: &SampleLoadError) -> Self {
        let field = match error {
            SampleLoadError::MissingField { field, .. } => Some((*field).to_string()),
            _ => None,
        };
        Self {
            sample_id: error.sample_id().to_string(),
            field,
            message: error.to_string(),
        }
    }
}

/// Output of evaluating one loaded sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub sample_id: String,
    pub source_project_name: String,
    pub expected_issue: String,
    /// Text produced by the live analyzer call.
    pub analyzer_output: Option<String>,
    /// Judge verdict, kept verbatim for inspection.
    pub raw_judge_response: Option<String>,
    pub score: Option<SimilarityScore>,
    /// True iff `score` meets the pass threshold.
    pub passed: bool,
    /// Terminal state.
    pub state: SampleState,
    pub error: Option<SampleFailure>,
    pub duration_ms: u64,
}

impl EvaluationResult {
    /// Whether the sample produced a valid score.
    pub fn is_scored(&self) -> bool {
        self.score.is_some()
    }

    /// Whether the sample ended in an error.
    pub fn is_errored(&self) -> bool {
        self.state == SampleState::Errored
    }
}

/// Tracks one sample through its state machine.
#[derive(Debug)]
pub struct SampleProgress {
    sample_id: String,
    source_project_name: String,
    expected_issue: String,
    state: SampleState,
    analyzer_output: Option<String>,
    raw_judge_response: Option<String>,
}

impl SampleProgress {
    /// Start tracking a freshly loaded sample.
    pub fn loaded(
        sample_id: impl Into<String>,
        source_project_name: impl Into<String>,
        expected_issue: impl Into<String>,
    ) -> Self {
        Self {
            sample_id: sample_id.into(),
            source_project_name: source_project_name.into(),
            expected_issue: expected_issue.into(),
            state: SampleState::Loaded,
            analyzer_output: None,
            raw_judge_response: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> SampleState {
        self.state
    }

    /// Record the analyzer output.
    pub fn analyzed(&mut self, output: impl Into<String>) {
        debug_assert_eq!(self.state, SampleState::Loaded);
        self.analyzer_output = Some(output.into());
        self.state = SampleState::Analyzed;
    }

    /// Record the judge verdict.
    pub fn judged(&mut self, verdict: impl Into<String>) {
        debug_assert_eq!(self.state, SampleState::Analyzed);
        self.raw_judge_response = Some(verdict.into());
        self.state = SampleState::Judged;
    }

    /// Close the sample with a score, landing in `Passed` or `Failed`.
    pub fn scored(mut self, score: SimilarityScore, duration_ms: u64) -> EvaluationResult {
        debug_assert_eq!(self.state, SampleState::Judged);
        self.state = SampleState::Scored;
        let passed = passes_threshold(score);
        let state = if passed {
            SampleState::Passed
        } else {
            SampleState::Failed
        };
        self.finish(state, Some(score), passed, None, duration_ms)
    }

    /// Close the sample as `Errored`, keeping whatever was produced so far.
    pub fn errored(self, error: &SampleError, duration_ms: u64) -> EvaluationResult {
        let failure = SampleFailure {
            kind: FailureKind::from(error),
            stage: self.state,
            message: error.to_string(),
        };
        self.finish(SampleState::Errored, None, false, Some(failure), duration_ms)
    }

    fn finish(
        self,
        state: SampleState,
        score: Option<SimilarityScore>,
        passed: bool,
        error: Option<SampleFailure>,
        duration_ms: u64,
    ) -> EvaluationResult {
        EvaluationResult {
            sample_id: self.sample_id,
            source_project_name: self.source_project_name,
            expected_issue: self.expected_issue,
            analyzer_output: self.analyzer_output,
            raw_judge_response: self.raw_judge_response,
            score,
            passed,
            state,
            error,
            duration_ms,
        }
    }
}
