//! Integration tests against a live OpenAI-compatible judge.
//!
//! These tests make real API calls.
//! Run with: OPENAI_API_KEY=your_key cargo test --test llm_integration -- --ignored
//!
//! `JUDGE_URL` and `JUDGE_MODEL` override the endpoint and model.

use std::sync::Arc;

use logdetective_eval::llm::{
    GenerationRequest, Judge, LiteLlmClient, LlmProvider, Message, SimilarityJudge,
};
use logdetective_eval::scoring::extract_score;

fn judge_url() -> String {
    std::env::var("JUDGE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".to_string())
}

fn judge_model() -> String {
    std::env::var("JUDGE_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string())
}

fn create_test_client() -> LiteLlmClient {
    LiteLlmClient::from_env(judge_url(), judge_model())
        .expect("OPENAI_API_KEY environment variable must be set for integration tests")
}

#[tokio::test]
#[ignore] // Run with: cargo test --test llm_integration -- --ignored
async fn test_simple_generation() {
    let client = create_test_client();

    let request = GenerationRequest::new(
        judge_model(),
        vec![
            Message::system("You are a helpful assistant. Reply concisely."),
            Message::user("What is 2 + 2? Reply with just the number."),
        ],
    )
    .with_max_tokens(10)
    .with_temperature(0.0);

    let response = client.generate(request).await;
    assert!(response.is_ok(), "Generation failed: {:?}", response.err());

    let response = response.expect("Should have response");
    let content = response.first_content().expect("Should have content");
    assert!(
        content.contains('4'),
        "Response should contain '4', got: {}",
        content
    );
}

#[tokio::test]
#[ignore]
async fn test_judge_scores_matching_analysis_high() {
    let judge = SimilarityJudge::new(Arc::new(create_test_client()), judge_model());

    let verdict = judge
        .judge(
            "The build fails because the spec file lacks BuildRequires: python3-pytest.",
            "The %check section runs pytest, but python3-pytest is not listed in BuildRequires, \
             so the test step fails with 'No module named pytest'.",
        )
        .await
        .expect("Judge call should succeed");

    let score = extract_score(&verdict)
        .unwrap_or_else(|e| panic!("No score in verdict {:?}: {}", verdict, e));
    assert!(score.value() >= 6, "Expected a high score, got {}", score);
}

#[tokio::test]
#[ignore]
async fn test_structured_verdict_is_parsable() {
    let judge = SimilarityJudge::new(Arc::new(create_test_client()), judge_model())
        .with_structured_verdict(true);

    let verdict = judge
        .judge(
            "Linker error: undefined reference to `pthread_create`, -lpthread is missing.",
            "The package fails to download sources because the upstream URL returns 404.",
        )
        .await
        .expect("Judge call should succeed");

    let score = extract_score(&verdict)
        .unwrap_or_else(|e| panic!("No score in verdict {:?}: {}", verdict, e));
    assert!(score.value() <= 5, "Expected a low score, got {}", score);
}
