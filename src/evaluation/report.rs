//! Aggregate report over all evaluated samples.

use std::fmt;
use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::result::{EvaluationResult, LoadFailure, SampleState};
use crate::scoring::PASS_THRESHOLD;

/// Longest excerpt of analyzer output or verdict shown in text reports.
const EXCERPT_LIMIT: usize = 300;

/// One sample that produced no score, with its reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEntry<'a> {
    pub sample_id: &'a str,
    pub reason: String,
}

/// Summary of one evaluation run.
///
/// `pass_rate` is `passed / (passed + failed)`: errored samples are reported
/// but never counted as failures. It is `None` when nothing was scored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateReport {
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub pass_threshold: u8,
    /// Dispatched samples, in corpus order.
    pub results: Vec<EvaluationResult>,
    /// Samples excluded before dispatch.
    pub load_errors: Vec<LoadFailure>,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    /// Mean score over scored samples.
    pub mean_score: Option<f64>,
    pub pass_rate: Option<f64>,
}

impl AggregateReport {
    /// Build a report and compute its aggregates.
    pub fn new(
        started_at: DateTime<Utc>,
        duration_ms: u64,
        results: Vec<EvaluationResult>,
        load_errors: Vec<LoadFailure>,
    ) -> Self {
        let passed = results
            .iter()
            .filter(|r| r.state == SampleState::Passed)
            .count();
        let failed = results
            .iter()
            .filter(|r| r.state == SampleState::Failed)
            .count();
        let errored = results.iter().filter(|r| r.is_errored()).count();

        let scores: Vec<f64> = results
            .iter()
            .filter_map(|r| r.score)
            .map(|s| f64::from(s.value()))
            .collect();
        let mean_score = if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<f64>() / scores.len() as f64)
        };

        let scored = passed + failed;
        let pass_rate = if scored > 0 {
            Some(passed as f64 / scored as f64)
        } else {
            None
        };

        Self {
            started_at,
            duration_ms,
            pass_threshold: PASS_THRESHOLD,
            results,
            load_errors,
            passed,
            failed,
            errored,
            mean_score,
            pass_rate,
        }
    }

    /// Number of samples with a valid score.
    pub fn scored(&self) -> usize {
        self.passed + self.failed
    }

    /// Number of dispatched samples.
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Every sample without a score: load exclusions first, then errored
    /// results.
    pub fn errors(&self) -> Vec<ErrorEntry<'_>> {
        let excluded = self.load_errors.iter().map(|f| ErrorEntry {
            sample_id: &f.sample_id,
            reason: f.message.clone(),
        });
        let errored = self.results.iter().filter_map(|r| {
            r.error.as_ref().map(|e| ErrorEntry {
                sample_id: &r.sample_id,
                reason: format!("{}: {}", e.kind.label(), e.message),
            })
        });
        excluded.chain(errored).collect()
    }

    /// Whether any sample errored or was excluded.
    pub fn has_errors(&self) -> bool {
        self.errored > 0 || !self.load_errors.is_empty()
    }

    /// Pretty JSON rendering.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Human-readable rendering with per-sample detail.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = self.write_text(&mut out);
        out
    }

    fn write_text(&self, out: &mut String) -> fmt::Result {
        writeln!(out, "🔬 Log Detective Evaluation")?;
        writeln!(out, "{}", "=".repeat(50))?;
        writeln!(out, "Started: {}", self.started_at.to_rfc3339())?;
        writeln!(out, "Pass threshold: {}/10", self.pass_threshold)?;
        writeln!(out)?;

        for result in &self.results {
            write_result(out, result)?;
        }

        let errors = self.errors();
        if !errors.is_empty() {
            writeln!(out, "⚠ Failures (no score):")?;
            for entry in &errors {
                writeln!(out, "   {} {}", entry.sample_id, entry.reason)?;
            }
            writeln!(out)?;
        }

        writeln!(out, "{}", "=".repeat(50))?;
        writeln!(out, "📊 Evaluation Summary")?;
        writeln!(out, "{}", "=".repeat(50))?;
        writeln!(out, "Samples evaluated: {}", self.total())?;
        writeln!(out, "Passed:   {}", self.passed)?;
        writeln!(out, "Failed:   {}", self.failed)?;
        writeln!(out, "Errored:  {}", self.errored)?;
        writeln!(out, "Excluded: {}", self.load_errors.len())?;
        match self.mean_score {
            Some(mean) => writeln!(out, "Mean score: {:.2}", mean)?,
            None => writeln!(out, "Mean score: n/a")?,
        }
        match self.pass_rate {
            Some(rate) => writeln!(out, "Pass rate: {:.1}%", rate * 100.0)?,
            None => writeln!(out, "Pass rate: n/a (no scored samples)")?,
        }
        writeln!(out, "Duration: {}ms", self.duration_ms)?;
        Ok(())
    }
}

fn write_result(out: &mut String, result: &EvaluationResult) -> fmt::Result {
    match (result.state, result.score) {
        (SampleState::Passed, Some(score)) => {
            writeln!(out, "✓ {} PASS score {}/10", result.sample_id, score)?
        }
        (SampleState::Failed, Some(score)) => writeln!(
            out,
            "✗ {} FAIL score {}/10 (below threshold)",
            result.sample_id, score
        )?,
        _ => {
            let label = result
                .error
                .as_ref()
                .map(|e| e.kind.label())
                .unwrap_or("error");
            writeln!(out, "⚠ {} ERROR {}", result.sample_id, label)?
        }
    }

    writeln!(out, "   Project: {}", result.source_project_name)?;
    writeln!(out, "   Expected: {}", excerpt(&result.expected_issue))?;
    if let Some(ref analysis) = result.analyzer_output {
        writeln!(out, "   Analyzer: {}", excerpt(analysis))?;
    }
    if let Some(ref failure) = result.error {
        writeln!(out, "   Reason: {}", failure.message)?;
        if let Some(ref verdict) = result.raw_judge_response {
            writeln!(out, "   Judge said: {}", excerpt(verdict))?;
        }
    }
    writeln!(out, "   Duration: {}ms", result.duration_ms)?;
    writeln!(out)
}

fn excerpt(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= EXCERPT_LIMIT {
        flat
    } else {
        let cut: String = flat.chars().take(EXCERPT_LIMIT).collect();
        format!("{}...", cut)
    }
}

impl fmt::Display for AggregateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_text())
    }
}
