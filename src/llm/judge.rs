//! LLM judge that compares the expected issue with the analyzer output.
//!
//! Each call is a fresh two-message conversation; nothing is carried over
//! between samples.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::litellm::{GenerationRequest, JsonSchemaFormat, LlmProvider, Message, ResponseFormat};
use crate::error::JudgeError;

/// System prompt for the judge.
pub const JUDGE_SYSTEM_PROMPT: &str = "You are a helpful assistant that provides similarity scores.";

/// Task description opening the judge prompt.
const JUDGE_INSTRUCTIONS: &str = "You are an AI performance evaluator. Your task is to compare two text snippets and rate their similarity on a scale of 1 to 10, where 1 means the texts do not match at all and 10 means they are identical or semantically equivalent.";

/// Closing instruction for a free-text verdict.
const TEXT_VERDICT_INSTRUCTION: &str = "You may explain your reasoning briefly. End your answer with a final line in exactly this form:\nSimilarity Score: N/10";

/// Closing instruction for a JSON verdict.
const JSON_VERDICT_INSTRUCTION: &str =
    "Respond only with a JSON object of the form {\"score\": N} where N is an integer from 1 to 10.";

/// Something that compares an expected issue with an actual analysis.
#[async_trait]
pub trait Judge: Send + Sync {
    /// Return the judge's raw verdict text.
    async fn judge(&self, expected_issue: &str, actual_analysis: &str) -> Result<String, JudgeError>;
}

/// Judge backed by a chat completion model.
pub struct SimilarityJudge {
    provider: Arc<dyn LlmProvider>,
    model: String,
    structured: bool,
}

impl SimilarityJudge {
    /// Create a judge that asks `model` for a free-text verdict.
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            structured: false,
        }
    }

    /// Ask for a `{"score": N}` JSON verdict through `response_format`.
    pub fn with_structured_verdict(mut self, structured: bool) -> Self {
        self.structured = structured;
        self
    }

    /// Model name sent with every request.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Build the chat request for one comparison.
    pub fn build_request(&self, expected_issue: &str, actual_analysis: &str) -> GenerationRequest {
        let verdict_instruction = if self.structured {
            JSON_VERDICT_INSTRUCTION
        } else {
            TEXT_VERDICT_INSTRUCTION
        };
        // Single pass: texts are inserted verbatim and never re-scanned.
        let prompt = format!(
            "{JUDGE_INSTRUCTIONS}\n\n\
             Expected Response:\n---\n{expected_issue}\n---\n\n\
             Actual Response:\n---\n{actual_analysis}\n---\n\n\
             {verdict_instruction}\n"
        );

        let request = GenerationRequest::new(
            self.model.clone(),
            vec![Message::system(JUDGE_SYSTEM_PROMPT), Message::user(prompt)],
        )
        .with_temperature(0.0);

        if self.structured {
            request.with_response_format(similarity_score_format())
        } else {
            request
        }
    }
}

/// JSON schema for a structured verdict: `{"score": 1..=10}`.
fn similarity_score_format() -> ResponseFormat {
    ResponseFormat::JsonSchema {
        json_schema: JsonSchemaFormat {
            name: "similarity-score".to_string(),
            schema: serde_json::json!({
                "title": "SimilarityScore",
                "type": "object",
                "properties": {
                    "score": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": 10,
                        "description": "The similarity score from 1 to 10."
                    }
                },
                "required": ["score"]
            }),
        },
    }
}

#[async_trait]
impl Judge for SimilarityJudge {
    async fn judge(&self, expected_issue: &str, actual_analysis: &str) -> Result<String, JudgeError> {
        let request = self.build_request(expected_issue, actual_analysis);
        let response = self.provider.generate(request).await?;

        let verdict = response
            .first_content()
            .filter(|content| !content.trim().is_empty())
            .ok_or(JudgeError::EmptyResponse)?;

        debug!(model = %self.model, verdict_chars = verdict.len(), "Judge responded");
        Ok(verdict.to_string())
    }
}
