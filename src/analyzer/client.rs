//! HTTP client for the Log Detective analyzer.
//!
//! The client submits one build log per request and returns the analysis
//! text. It performs no retries: every failure is reported to the caller as
//! an [`AnalyzerError`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{AnalyzerError, ConfigError};

/// Default endpoint path appended to the analyzer base URL.
pub const DEFAULT_ANALYZER_PATH: &str = "/analyze/staged";

/// Default request timeout for the analyzer.
pub const DEFAULT_ANALYZER_TIMEOUT: Duration = Duration::from_secs(60);

/// Public location of the upstream sample corpus, used in URL mode.
pub const DEFAULT_LOG_BASE_URL: &str =
    "https://raw.githubusercontent.com/fedora-copr/logdetective-sample/main/data/";

/// Maximum number of characters of an error body kept in an error.
const ERROR_BODY_LIMIT: usize = 500;

/// How the log is handed to the analyzer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionMode {
    /// POST the raw log bytes as the request body.
    #[default]
    Inline,
    /// POST `{"url": ...}` pointing at the published copy of the log.
    Url,
}

/// Analyzer endpoint configuration.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Base URL of the analyzer server (e.g. `http://localhost:8080`).
    pub base_url: String,
    /// Endpoint variant appended to `base_url`.
    pub endpoint_path: String,
    pub mode: SubmissionMode,
    /// Base URL under which `<sample-id>/<log_file>` is published (URL mode).
    pub log_base_url: String,
    pub timeout: Duration,
}

impl AnalyzerConfig {
    /// Creates a configuration for `base_url` with default settings.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            endpoint_path: DEFAULT_ANALYZER_PATH.to_string(),
            mode: SubmissionMode::default(),
            log_base_url: DEFAULT_LOG_BASE_URL.to_string(),
            timeout: DEFAULT_ANALYZER_TIMEOUT,
        }
    }

    /// Sets the endpoint path.
    pub fn with_endpoint_path(mut self, path: impl Into<String>) -> Self {
        self.endpoint_path = path.into();
        self
    }

    /// Sets the submission mode.
    pub fn with_mode(mut self, mode: SubmissionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the base URL of the published logs.
    pub fn with_log_base_url(mut self, url: impl Into<String>) -> Self {
        self.log_base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full URL of the analyzer endpoint.
    pub fn endpoint_url(&self) -> String {
        join_url(&self.base_url, &self.endpoint_path)
    }
}

/// One log submitted for analysis.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisRequest<'a> {
    pub sample_id: &'a str,
    pub log_file: &'a str,
    pub log_bytes: &'a [u8],
}

/// Something that turns a build log into a diagnosis.
#[async_trait]
pub trait LogAnalyzer: Send + Sync {
    /// Analyze one log and return the analysis text.
    async fn analyze(&self, request: AnalysisRequest<'_>) -> Result<String, AnalyzerError>;
}

/// Body sent in URL mode.
#[derive(Debug, Serialize)]
struct UrlPayload {
    url: String,
}

/// HTTP implementation of [`LogAnalyzer`].
pub struct AnalyzerClient {
    config: AnalyzerConfig,
    endpoint: String,
    log_base: Url,
    http_client: Client,
}

impl AnalyzerClient {
    /// Build a client for the given configuration.
    pub fn new(config: AnalyzerConfig) -> Result<Self, ConfigError> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        let log_base = parse_log_base(&config.log_base_url)?;
        Ok(Self {
            endpoint: config.endpoint_url(),
            config,
            log_base,
            http_client,
        })
    }

    /// Analyzer endpoint URL in use.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Published URL of a sample's log, used in URL mode. Both parts are
    /// percent-encoded as single path segments.
    pub fn log_url(&self, sample_id: &str, log_file: &str) -> String {
        let mut url = self.log_base.clone();
        // Cannot fail: `parse_log_base` rejects cannot-be-a-base URLs.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(sample_id).push(log_file);
        }
        url.to_string()
    }

    fn transport_error(&self, error: reqwest::Error) -> AnalyzerError {
        if error.is_timeout() {
            AnalyzerError::Timeout(self.config.timeout)
        } else {
            AnalyzerError::Transport(error.to_string())
        }
    }
}

#[async_trait]
impl LogAnalyzer for AnalyzerClient {
    async fn analyze(&self, request: AnalysisRequest<'_>) -> Result<String, AnalyzerError> {
        let http_request = self.http_client.post(&self.endpoint);
        let http_request = match self.config.mode {
            SubmissionMode::Inline => http_request
                .header(CONTENT_TYPE, "text/plain; charset=utf-8")
                .body(request.log_bytes.to_vec()),
            SubmissionMode::Url => http_request.json(&UrlPayload {
                url: self.log_url(request.sample_id, request.log_file),
            }),
        };

        debug!(
            sample_id = %request.sample_id,
            endpoint = %self.endpoint,
            mode = ?self.config.mode,
            "Calling analyzer"
        );

        let response = http_request
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            return Err(AnalyzerError::Status {
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;

        parse_analysis(&body)
    }
}

/// Extract the analysis text from a response body.
///
/// JSON objects must carry `explanation.text`; a JSON string is unwrapped;
/// anything else is taken verbatim.
pub fn parse_analysis(body: &str) -> Result<String, AnalyzerError> {
    let text = match serde_json::from_str::<Value>(body) {
        Ok(value @ Value::Object(_)) => value
            .pointer("/explanation/text")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                AnalyzerError::MalformedResponse(
                    "response JSON has no 'explanation.text'".to_string(),
                )
            })?,
        Ok(Value::String(text)) => text,
        _ => body.to_string(),
    };

    if text.trim().is_empty() {
        return Err(AnalyzerError::EmptyResponse);
    }
    Ok(text)
}

/// Join a base URL and a path with exactly one slash between them.
fn parse_log_base(value: &str) -> Result<Url, ConfigError> {
    let invalid = |message: String| ConfigError::InvalidValue {
        key: "log_base_url".to_string(),
        message,
    };
    let url = Url::parse(value).map_err(|e| invalid(format!("'{}': {}", value, e)))?;
    if url.cannot_be_a_base() {
        return Err(invalid(format!("'{}' cannot hold a path", value)));
    }
    Ok(url)
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SAMPLE_ID: &str = "0b7f6d1e-3c4a-4f2b-9d8e-1a2b3c4d5e6f";

    fn request(log: &[u8]) -> AnalysisRequest<'_> {
        AnalysisRequest {
            sample_id: SAMPLE_ID,
            log_file: "builder-live.log",
            log_bytes: log,
        }
    }

    fn client_for(server: &MockServer, mode: SubmissionMode) -> AnalyzerClient {
        let config = AnalyzerConfig::new(server.uri())
            .with_mode(mode)
            .with_log_base_url("https://logs.example.org/data/");
        AnalyzerClient::new(config).expect("failed to create client")
    }

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("http://localhost:8080/", "/analyze/staged"),
            "http://localhost:8080/analyze/staged"
        );
        assert_eq!(join_url("http://host", "analyze"), "http://host/analyze");
        assert_eq!(join_url("http://host/", ""), "http://host");
    }

    #[test]
    fn test_parse_analysis_variants() {
        let json = r#"{"explanation": {"text": "Missing pytest", "logprobs": null}}"#;
        assert_eq!(parse_analysis(json).unwrap(), "Missing pytest");
        assert_eq!(parse_analysis("\"quoted\"").unwrap(), "quoted");
        assert_eq!(parse_analysis("plain text answer").unwrap(), "plain text answer");
        assert!(matches!(
            parse_analysis(r#"{"response": "x"}"#),
            Err(AnalyzerError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_analysis("  \n"),
            Err(AnalyzerError::EmptyResponse)
        ));
        assert!(matches!(
            parse_analysis(r#"{"explanation": {"text": ""}}"#),
            Err(AnalyzerError::EmptyResponse)
        ));
    }

    #[test]
    fn test_log_url() {
        let client = AnalyzerClient::new(
            AnalyzerConfig::new("http://localhost:8080").with_mode(SubmissionMode::Url),
        )
        .expect("client");
        assert_eq!(
            client.log_url(SAMPLE_ID, "build.log"),
            format!(
                "https://raw.githubusercontent.com/fedora-copr/logdetective-sample/main/data/{}/build.log",
                SAMPLE_ID
            )
        );
        assert_eq!(client.endpoint(), "http://localhost:8080/analyze/staged");
    }

    #[test]
    fn test_log_url_encodes_file_name() {
        let client = AnalyzerClient::new(
            AnalyzerConfig::new("http://localhost:8080")
                .with_mode(SubmissionMode::Url)
                .with_log_base_url("https://logs.example.org/data"),
        )
        .expect("client");
        assert_eq!(
            client.log_url(SAMPLE_ID, "build log#1.txt"),
            format!("https://logs.example.org/data/{}/build%20log%231.txt", SAMPLE_ID)
        );
    }

    #[test]
    fn test_invalid_log_base_is_rejected() {
        let result = AnalyzerClient::new(
            AnalyzerConfig::new("http://localhost:8080").with_log_base_url("not a url"),
        );
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "log_base_url"
        ));
    }

    #[tokio::test]
    async fn test_inline_submission_sends_raw_log() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/analyze/staged"))
            .and(body_string("error: linker failed\n"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "explanation": {"text": "The linker could not find libfoo."}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server, SubmissionMode::Inline);
        let analysis = client
            .analyze(request(b"error: linker failed\n"))
            .await
            .expect("analysis");
        assert_eq!(analysis, "The linker could not find libfoo.");
    }

    #[tokio::test]
    async fn test_url_submission_sends_log_url() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/analyze/staged"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({
                "url": format!("https://logs.example.org/data/{}/builder-live.log", SAMPLE_ID)
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string("Plain analysis"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server, SubmissionMode::Url);
        let analysis = client.analyze(request(b"ignored")).await.expect("analysis");
        assert_eq!(analysis, "Plain analysis");
    }

    #[tokio::test]
    async fn test_non_success_status_is_reported() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/analyze/staged"))
            .respond_with(ResponseTemplate::new(503).set_body_string("model loading"))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server, SubmissionMode::Inline);
        let err = client.analyze(request(b"log")).await.unwrap_err();
        match err {
            AnalyzerError::Status { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "model loading");
            }
            other => panic!("expected Status, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_body_is_reported() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server, SubmissionMode::Inline);
        let err = client.analyze(request(b"log")).await.unwrap_err();
        assert!(matches!(err, AnalyzerError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_slow_analyzer_times_out() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("late")
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&mock_server)
            .await;

        let config = AnalyzerConfig::new(mock_server.uri()).with_timeout(Duration::from_millis(200));
        let client = AnalyzerClient::new(config).expect("client");
        let err = client.analyze(request(b"log")).await.unwrap_err();
        assert!(matches!(err, AnalyzerError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_connection_error() {
        // Port that is unlikely to have a server.
        let client = AnalyzerClient::new(AnalyzerConfig::new("http://127.0.0.1:65535"))
            .expect("client");
        let err = client.analyze(request(b"log")).await.unwrap_err();
        assert!(matches!(err, AnalyzerError::Transport(_)));
    }
}
