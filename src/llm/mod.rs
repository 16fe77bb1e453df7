//! LLM integration for politeness-bench.
//!
//! [`LiteLlmClient`] speaks the OpenAI-compatible chat completions protocol
//! (a LiteLLM proxy or OpenRouter). [`StoryGenerator`] sits on top of any
//! [`LlmProvider`] and turns a prompt into a parsed JSON document.
//!
//! ```ignore
//! use std::sync::Arc;
//! use politeness_bench::llm::{GenerateOptions, LiteLlmClient, StoryGenerator};
//!
//! let client = LiteLlmClient::openrouter(api_key, None);
//! let generator = StoryGenerator::new(Arc::new(client));
//! let document = generator.generate(&prompt, &GenerateOptions::default()).await?;
//! ```

pub mod litellm;
pub mod story;

pub use litellm::{
    Choice, GenerationRequest, GenerationResponse, LiteLlmClient, LlmProvider, Message,
    ResponseFormat, Usage, DEFAULT_MODEL, OPENROUTER_BASE_URL,
};
pub use story::{parse_document, GenerateOptions, StoryGenerator};
