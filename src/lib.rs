//! politeness-bench: does phrasing a request politely change the structure
//! of what an LLM generates?
//!
//! The library renders the same story prompt in a polite and an impolite
//! phrasing, collects JSON documents from an OpenAI-compatible backend and
//! scores them with a structural rubric.

pub mod cli;
pub mod error;
pub mod fixture;
pub mod llm;
pub mod pipeline;
pub mod scoring;
pub mod storage;
pub mod utils;

// Re-export commonly used error types
pub use error::{
    ConfigError, EvaluationError, FixtureError, GenerationError, LlmError, StoreError,
};

pub use fixture::{Condition, Fixture, FixtureGenerator};
pub use pipeline::{BatchRunner, EvaluationReport, Evaluator, HarnessConfig};
pub use scoring::{score, RubricConfig, StoryDocument};
