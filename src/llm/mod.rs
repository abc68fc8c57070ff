//! LLM integration for logdetective-eval.
//!
//! Provides an OpenAI-compatible chat completion client and the judge built
//! on top of it.
//!
//! ```ignore
//! use logdetective_eval::llm::{Judge, LiteLlmClient, SimilarityJudge};
//! use std::sync::Arc;
//!
//! let client = LiteLlmClient::from_env("http://localhost:4000/v1", "granite-3.3-8b")?;
//! let judge = SimilarityJudge::new(Arc::new(client), "granite-3.3-8b");
//! let verdict = judge.judge("Missing BuildRequires: pytest", analysis).await?;
//! ```

pub mod judge;
pub mod litellm;

pub use judge::{Judge, SimilarityJudge, JUDGE_SYSTEM_PROMPT};
pub use litellm::{
    Choice, GenerationRequest, GenerationResponse, JsonSchemaFormat, LiteLlmClient, LlmProvider,
    Message, ResponseFormat, Usage, API_KEY_ENV, DEFAULT_LLM_TIMEOUT,
};
