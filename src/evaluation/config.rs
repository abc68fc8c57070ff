//! Run configuration for an evaluation.
//!
//! All settings of one invocation are gathered in [`EvalConfig`] and checked
//! by [`EvalConfig::validate`] before any sample is touched. Validation
//! failures are fatal [`ConfigError`]s.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;

use crate::analyzer::{
    AnalyzerConfig, SubmissionMode, DEFAULT_ANALYZER_PATH, DEFAULT_ANALYZER_TIMEOUT,
    DEFAULT_LOG_BASE_URL,
};
use crate::error::ConfigError;
use crate::llm::DEFAULT_LLM_TIMEOUT;

/// Default number of samples evaluated concurrently.
pub const DEFAULT_WORKERS: usize = 4;

/// Configuration for one evaluation run.
#[derive(Debug, Clone)]
pub struct EvalConfig {
    // Corpus
    /// Directory holding the UUID-named sample directories.
    pub corpus_root: PathBuf,

    // Analyzer settings
    /// Base URL of the analyzer server.
    pub analyzer_url: String,
    /// Endpoint variant appended to `analyzer_url`.
    pub analyzer_path: String,
    pub submission_mode: SubmissionMode,
    /// Where logs are published, for URL submission.
    pub log_base_url: String,
    pub analyzer_timeout: Duration,

    // Judge settings
    /// Base URL of the OpenAI-compatible judge API.
    pub judge_url: String,
    /// Judge model name.
    pub judge_model: String,
    /// Judge credential.
    pub judge_api_key: Option<String>,
    pub judge_timeout: Duration,
    /// Ask the judge for a JSON `{"score": N}` verdict.
    pub structured_verdict: bool,

    // Execution settings
    /// Maximum number of samples in flight.
    pub workers: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            corpus_root: PathBuf::from("./data"),

            analyzer_url: "http://localhost:8080".to_string(),
            analyzer_path: DEFAULT_ANALYZER_PATH.to_string(),
            submission_mode: SubmissionMode::default(),
            log_base_url: DEFAULT_LOG_BASE_URL.to_string(),
            analyzer_timeout: DEFAULT_ANALYZER_TIMEOUT,

            judge_url: "http://localhost:4000/v1".to_string(),
            judge_model: String::new(),
            judge_api_key: None,
            judge_timeout: DEFAULT_LLM_TIMEOUT,
            structured_verdict: false,

            workers: DEFAULT_WORKERS,
        }
    }
}

impl EvalConfig {
    /// Creates a configuration from the four positional run parameters.
    pub fn new(
        corpus_root: impl Into<PathBuf>,
        analyzer_url: impl Into<String>,
        judge_url: impl Into<String>,
        judge_model: impl Into<String>,
    ) -> Self {
        Self {
            corpus_root: corpus_root.into(),
            analyzer_url: analyzer_url.into(),
            judge_url: judge_url.into(),
            judge_model: judge_model.into(),
            ..Default::default()
        }
    }

    /// Sets the judge credential.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.judge_api_key = Some(api_key.into());
        self
    }

    /// Sets the analyzer endpoint path.
    pub fn with_analyzer_path(mut self, path: impl Into<String>) -> Self {
        self.analyzer_path = path.into();
        self
    }

    /// Sets how logs are submitted to the analyzer.
    pub fn with_submission_mode(mut self, mode: SubmissionMode) -> Self {
        self.submission_mode = mode;
        self
    }

    /// Sets the base URL of published logs.
    pub fn with_log_base_url(mut self, url: impl Into<String>) -> Self {
        self.log_base_url = url.into();
        self
    }

    /// Sets the analyzer timeout.
    pub fn with_analyzer_timeout(mut self, timeout: Duration) -> Self {
        self.analyzer_timeout = timeout;
        self
    }

    /// Sets the judge timeout.
    pub fn with_judge_timeout(mut self, timeout: Duration) -> Self {
        self.judge_timeout = timeout;
        self
    }

    /// Requests structured JSON verdicts from the judge.
    pub fn with_structured_verdict(mut self, structured: bool) -> Self {
        self.structured_verdict = structured;
        self
    }

    /// Sets the number of concurrent workers.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// The judge credential, if present and non-empty.
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        self.judge_api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingCredential)
    }

    /// Analyzer client settings derived from this configuration.
    pub fn analyzer_config(&self) -> AnalyzerConfig {
        AnalyzerConfig::new(self.analyzer_url.clone())
            .with_endpoint_path(self.analyzer_path.clone())
            .with_mode(self.submission_mode)
            .with_log_base_url(self.log_base_url.clone())
            .with_timeout(self.analyzer_timeout)
    }

    /// Check the configuration. The credential is checked first so that a
    /// missing secret is reported even when other settings are also wrong.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.api_key()?;

        if !self.corpus_root.exists() {
            return Err(ConfigError::CorpusNotFound(self.corpus_root.clone()));
        }
        if !self.corpus_root.is_dir() {
            return Err(ConfigError::CorpusNotDirectory(self.corpus_root.clone()));
        }

        validate_url("analyzer_url", &self.analyzer_url)?;
        validate_url("judge_url", &self.judge_url)?;
        validate_url("log_base_url", &self.log_base_url)?;

        if self.judge_model.trim().is_empty() {
            return Err(invalid("judge_model", "must not be empty"));
        }
        if self.workers == 0 {
            return Err(invalid("workers", "must be at least 1"));
        }
        if self.analyzer_timeout.is_zero() {
            return Err(invalid("analyzer_timeout", "must be greater than zero"));
        }
        if self.judge_timeout.is_zero() {
            return Err(invalid("judge_timeout", "must be greater than zero"));
        }

        Ok(())
    }
}

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.into(),
    }
}

fn validate_url(key: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value).map_err(|e| invalid(key, format!("'{}': {}", value, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(key, format!("unsupported scheme '{}'", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn valid_config(dir: &TempDir) -> EvalConfig {
        EvalConfig::new(
            dir.path(),
            "http://localhost:8080",
            "http://localhost:4000/v1",
            "granite-judge",
        )
        .with_api_key("sk-test")
    }

    #[test]
    fn test_defaults() {
        let config = EvalConfig::default();
        assert_eq!(config.analyzer_path, "/analyze/staged");
        assert_eq!(config.analyzer_timeout, Duration::from_secs(60));
        assert_eq!(config.judge_timeout, Duration::from_secs(120));
        assert_eq!(config.workers, DEFAULT_WORKERS);
        assert_eq!(config.submission_mode, SubmissionMode::Inline);
        assert!(!config.structured_verdict);
    }

    #[test]
    fn test_valid_config() {
        let dir = TempDir::new().expect("failed to create temp dir");
        assert!(valid_config(&dir).validate().is_ok());
    }

    #[test]
    fn test_missing_credential_is_fatal() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let mut config = valid_config(&dir);
        config.judge_api_key = None;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingCredential)
        ));

        config.judge_api_key = Some(String::new());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingCredential)
        ));
    }

    #[test]
    fn test_missing_corpus_is_fatal() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let mut config = valid_config(&dir);
        config.corpus_root = dir.path().join("missing");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::CorpusNotFound(_))
        ));
    }

    #[test]
    fn test_invalid_values() {
        let dir = TempDir::new().expect("failed to create temp dir");

        let config = valid_config(&dir).with_workers(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "workers"
        ));

        let mut config = valid_config(&dir);
        config.judge_url = "not a url".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "judge_url"
        ));

        let mut config = valid_config(&dir);
        config.analyzer_url = "ftp://example.org".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "analyzer_url"
        ));

        let config = valid_config(&dir).with_analyzer_timeout(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_analyzer_config_mapping() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let config = valid_config(&dir)
            .with_analyzer_path("/analyze")
            .with_submission_mode(SubmissionMode::Url)
            .with_analyzer_timeout(Duration::from_secs(5));
        let analyzer = config.analyzer_config();
        assert_eq!(analyzer.endpoint_url(), "http://localhost:8080/analyze");
        assert_eq!(analyzer.mode, SubmissionMode::Url);
        assert_eq!(analyzer.timeout, Duration::from_secs(5));
    }
}
