//! Evaluation orchestrator.
//!
//! Drives every sample of a corpus through load, analyze, judge and score.
//! Samples are independent: each worker owns one sample end-to-end and a
//! semaphore bounds how many are in flight. Per-sample failures become
//! result entries and never abort the run.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use super::config::{EvalConfig, DEFAULT_WORKERS};
use super::report::AggregateReport;
use super::result::{EvaluationResult, LoadFailure, SampleProgress};
use crate::analyzer::{AnalysisRequest, AnalyzerClient, LogAnalyzer};
use crate::corpus::{Sample, SampleDir, SampleLoader};
use crate::error::{ConfigError, SampleError};
use crate::llm::{Judge, LiteLlmClient, SimilarityJudge};
use crate::scoring::{extract_score, SimilarityScore};

/// Outcome of one sample directory.
#[derive(Debug)]
pub enum SampleOutcome {
    /// The sample was excluded before dispatch.
    LoadFailed(LoadFailure),
    /// The sample went through the pipeline.
    Evaluated(EvaluationResult),
}

/// Runs the evaluation pipeline over a corpus.
pub struct Orchestrator {
    analyzer: Arc<dyn LogAnalyzer>,
    judge: Arc<dyn Judge>,
    workers: usize,
}

impl Orchestrator {
    /// Create an orchestrator over the given analyzer and judge.
    pub fn new(analyzer: Arc<dyn LogAnalyzer>, judge: Arc<dyn Judge>) -> Self {
        Self {
            analyzer,
            judge,
            workers: DEFAULT_WORKERS,
        }
    }

    /// Set the maximum number of samples processed concurrently.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Build the HTTP analyzer and judge clients from a validated
    /// configuration.
    pub fn from_config(config: &EvalConfig) -> Result<Self, ConfigError> {
        let analyzer = AnalyzerClient::new(config.analyzer_config())?;
        let llm = LiteLlmClient::new(
            config.judge_url.clone(),
            config.api_key()?,
            config.judge_model.clone(),
            config.judge_timeout,
        )?;
        let judge = SimilarityJudge::new(Arc::new(llm), config.judge_model.clone())
            .with_structured_verdict(config.structured_verdict);

        info!(
            analyzer = %analyzer.endpoint(),
            judge_url = %config.judge_url,
            judge_model = %config.judge_model,
            workers = config.workers,
            "Evaluation clients ready"
        );

        Ok(Self::new(Arc::new(analyzer), Arc::new(judge)).with_workers(config.workers))
    }

    /// Evaluate every sample of the corpus and aggregate the results.
    ///
    /// Results are reported in corpus order regardless of completion order.
    pub async fn run(&self, loader: &SampleLoader) -> AggregateReport {
        let started_at = Utc::now();
        let start = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.workers));

        info!(corpus = %loader.root().display(), workers = self.workers, "Starting evaluation");

        let futures: Vec<_> = loader
            .candidates()
            .map(|dir| {
                let semaphore = semaphore.clone();
                async move {
                    // The semaphore is never closed, so acquisition cannot fail.
                    let _permit = semaphore.acquire().await.ok();
                    self.process(dir).await
                }
            })
            .collect();

        let mut results = Vec::with_capacity(futures.len());
        let mut load_errors = Vec::new();
        for outcome in join_all(futures).await {
            match outcome {
                SampleOutcome::Evaluated(result) => results.push(result),
                SampleOutcome::LoadFailed(failure) => load_errors.push(failure),
            }
        }

        let report = AggregateReport::new(
            started_at,
            start.elapsed().as_millis() as u64,
            results,
            load_errors,
        );

        info!(
            passed = report.passed,
            failed = report.failed,
            errored = report.errored,
            load_errors = report.load_errors.len(),
            "Evaluation finished"
        );

        report
    }

    /// Load and evaluate one sample directory.
    pub async fn process(&self, dir: SampleDir) -> SampleOutcome {
        match dir.load() {
            Ok(sample) => SampleOutcome::Evaluated(self.evaluate(&sample).await),
            Err(e) => {
                warn!(sample_id = %dir.id, error = %e, "Sample excluded");
                SampleOutcome::LoadFailed(LoadFailure::from(&e))
            }
        }
    }

    /// Evaluate one loaded sample. Never fails: errors are recorded in the
    /// result.
    pub async fn evaluate(&self, sample: &Sample) -> EvaluationResult {
        let start = Instant::now();
        let sample_id = sample.id.to_string();
        let mut progress =
            SampleProgress::loaded(&sample_id, &sample.source_project_name, &sample.issue);

        let outcome = self.score_sample(sample, &mut progress).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(score) => {
                let result = progress.scored(score, duration_ms);
                info!(
                    sample_id = %sample_id,
                    score = score.value(),
                    passed = result.passed,
                    "Sample scored"
                );
                result
            }
            Err(e) => {
                warn!(
                    sample_id = %sample_id,
                    stage = ?progress.state(),
                    error = %e,
                    "Sample errored"
                );
                progress.errored(&e, duration_ms)
            }
        }
    }

    async fn score_sample(
        &self,
        sample: &Sample,
        progress: &mut SampleProgress,
    ) -> Result<SimilarityScore, SampleError> {
        let sample_id = sample.id.to_string();

        let analysis = self
            .analyzer
            .analyze(AnalysisRequest {
                sample_id: &sample_id,
                log_file: &sample.log_file,
                log_bytes: sample.log_bytes(),
            })
            .await?;
        progress.analyzed(analysis.as_str());

        let verdict = self.judge.judge(&sample.issue, &analysis).await?;
        progress.judged(verdict.as_str());

        Ok(extract_score(&verdict)?)
    }
}

/// Validate `config`, then evaluate its corpus.
///
/// # Errors
///
/// Only configuration problems are returned; per-sample failures are part of
/// the report.
pub async fn run(config: &EvalConfig) -> Result<AggregateReport, ConfigError> {
    config.validate()?;
    let loader = SampleLoader::new(&config.corpus_root)?;
    let orchestrator = Orchestrator::from_config(config)?;
    Ok(orchestrator.run(&loader).await)
}
