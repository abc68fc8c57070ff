//! CLI definition and the evaluation command.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use crate::analyzer::{SubmissionMode, DEFAULT_ANALYZER_PATH, DEFAULT_LOG_BASE_URL};
use crate::corpus::SampleLoader;
use crate::evaluation::{AggregateReport, EvalConfig, Orchestrator, DEFAULT_WORKERS};
use crate::llm::API_KEY_ENV;

/// Evaluate Log Detective against a labeled corpus using an LLM judge.
#[derive(Parser, Debug)]
#[command(name = "logdetective-eval")]
#[command(about = "Score Log Detective build-log analyses against labeled samples with an LLM judge")]
#[command(version)]
#[command(
    long_about = "logdetective-eval submits every sample log of a corpus to a running Log Detective analyzer, asks an OpenAI-compatible judge model how similar each analysis is to the expected issue, and reports per-sample scores and the overall pass rate.\n\nExample usage:\n  OPENAI_API_KEY=sk-... logdetective-eval ./data http://localhost:8080 https://api.openai.com/v1 gpt-4o"
)]
pub struct Cli {
    /// Directory containing one UUID-named directory per sample.
    pub corpus_path: PathBuf,

    /// Base URL of the running analyzer.
    pub analyzer_url: String,

    /// Base URL of the OpenAI-compatible judge API.
    pub judge_url: String,

    /// Judge model name.
    pub judge_model: String,

    /// Judge API key.
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Analyzer endpoint path appended to the analyzer URL.
    #[arg(long, default_value = DEFAULT_ANALYZER_PATH)]
    pub analyzer_path: String,

    /// How logs are submitted to the analyzer.
    #[arg(long, value_enum, default_value_t = SubmissionMode::Inline)]
    pub analyzer_mode: SubmissionMode,

    /// Base URL where sample logs are published (url mode only).
    #[arg(long, default_value = DEFAULT_LOG_BASE_URL)]
    pub log_base_url: String,

    /// Analyzer request timeout in seconds.
    #[arg(long, default_value = "60")]
    pub analyzer_timeout: u64,

    /// Judge request timeout in seconds.
    #[arg(long, default_value = "120")]
    pub judge_timeout: u64,

    /// Maximum number of samples evaluated concurrently.
    #[arg(short = 'w', long, default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,

    /// Ask the judge for a JSON verdict ({"score": N}).
    #[arg(long)]
    pub structured_verdict: bool,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    /// Run configuration described by these arguments.
    pub fn to_config(&self) -> EvalConfig {
        let mut config = EvalConfig::new(
            self.corpus_path.clone(),
            self.analyzer_url.clone(),
            self.judge_url.clone(),
            self.judge_model.clone(),
        )
        .with_analyzer_path(self.analyzer_path.clone())
        .with_submission_mode(self.analyzer_mode)
        .with_log_base_url(self.log_base_url.clone())
        .with_analyzer_timeout(Duration::from_secs(self.analyzer_timeout))
        .with_judge_timeout(Duration::from_secs(self.judge_timeout))
        .with_structured_verdict(self.structured_verdict)
        .with_workers(self.workers);

        if let Some(ref key) = self.api_key {
            config = config.with_api_key(key.clone());
        }
        config
    }
}

/// Parse CLI arguments without running anything.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Parse CLI arguments and run the evaluation.
///
/// For control over logging initialization, use `parse_cli()` and
/// `run_with_cli()`.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Run the evaluation described by `cli` and print its report to stdout.
///
/// Returns an error on configuration problems or interruption. Sample
/// failures are part of the report and do not make the run fail.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    let config = cli.to_config();
    config
        .validate()
        .context("Invalid evaluation configuration")?;

    let loader =
        SampleLoader::new(&config.corpus_root).context("Failed to open sample corpus")?;
    let orchestrator =
        Orchestrator::from_config(&config).context("Failed to set up evaluation clients")?;

    let report = tokio::select! {
        report = orchestrator.run(&loader) => report,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, discarding partial results");
            anyhow::bail!("Evaluation interrupted");
        }
    };

    print_report(&report, cli.json)?;

    if report.has_errors() {
        info!(
            errored = report.errored,
            excluded = report.load_errors.len(),
            "Some samples produced no score"
        );
    }
    Ok(())
}

fn print_report(report: &AggregateReport, json: bool) -> anyhow::Result<()> {
    if json {
        let json_output = report
            .to_json()
            .map_err(|e| anyhow::anyhow!("Failed to serialize JSON output: {}", e))?;
        println!("{}", json_output);
    } else {
        print!("{}", report);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    const BASE_ARGS: [&str; 5] = [
        "logdetective-eval",
        "./data",
        "http://localhost:8080",
        "http://localhost:4000/v1",
        "granite-judge",
    ];

    #[test]
    fn test_cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_positional_args_and_defaults() {
        let cli = Cli::try_parse_from(BASE_ARGS).expect("should parse");
        assert_eq!(cli.corpus_path, PathBuf::from("./data"));
        assert_eq!(cli.analyzer_url, "http://localhost:8080");
        assert_eq!(cli.judge_url, "http://localhost:4000/v1");
        assert_eq!(cli.judge_model, "granite-judge");
        assert_eq!(cli.analyzer_path, DEFAULT_ANALYZER_PATH);
        assert_eq!(cli.analyzer_mode, SubmissionMode::Inline);
        assert_eq!(cli.analyzer_timeout, 60);
        assert_eq!(cli.judge_timeout, 120);
        assert_eq!(cli.workers, DEFAULT_WORKERS);
        assert!(!cli.structured_verdict);
        assert!(!cli.json);
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn test_missing_positional_is_rejected() {
        let result = Cli::try_parse_from(&BASE_ARGS[..4]);
        assert!(result.is_err());
    }

    #[test]
    fn test_options_map_to_config() {
        let mut args = BASE_ARGS.to_vec();
        args.extend([
            "--api-key",
            "sk-test",
            "--analyzer-mode",
            "url",
            "--analyzer-timeout",
            "5",
            "-w",
            "8",
            "--structured-verdict",
            "--json",
        ]);
        let cli = Cli::try_parse_from(args).expect("should parse");
        assert!(cli.json);

        let config = cli.to_config();
        assert_eq!(config.judge_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.submission_mode, SubmissionMode::Url);
        assert_eq!(config.analyzer_timeout, Duration::from_secs(5));
        assert_eq!(config.judge_timeout, Duration::from_secs(120));
        assert_eq!(config.workers, 8);
        assert!(config.structured_verdict);
        assert_eq!(config.corpus_root, PathBuf::from("./data"));
    }

    #[test]
    fn test_invalid_mode_is_rejected() {
        let mut args = BASE_ARGS.to_vec();
        args.extend(["--analyzer-mode", "carrier-pigeon"]);
        assert!(Cli::try_parse_from(args).is_err());
    }
}
