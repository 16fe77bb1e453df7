//! Error types for politeness-bench operations.
//!
//! Defines error types for the major subsystems:
//! - LLM API interactions
//! - Story generation (backend failures and malformed replies)
//! - Artifact storage
//! - Fixture generation
//! - Evaluation of persisted artifacts
//! - Configuration loading

use std::time::Duration;

use thiserror::Error;

use crate::fixture::Condition;

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Missing API key: set OPENROUTER_API_KEY or LITELLM_API_KEY")]
    MissingApiKey,

    #[error("Missing API base URL: LITELLM_API_BASE environment variable not set")]
    MissingApiBase,

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse LLM response: {0}")]
    ParseError(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("API error ({code}): {message}")]
    ApiError { code: u16, message: String },

    #[error("LLM returned no choices")]
    EmptyResponse,
}

impl LlmError {
    /// Whether retrying the same request later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::RequestFailed(msg) => {
                let msg = msg.to_lowercase();
                msg.contains("timeout")
                    || msg.contains("timed out")
                    || msg.contains("connection")
                    || msg.contains("temporarily")
            }
            LlmError::RateLimited(_) => true,
            LlmError::ApiError { code, .. } => *code >= 500 || *code == 429,
            _ => false,
        }
    }
}

/// Errors produced by the story generation adapter.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The backend call itself failed (network, auth, quota).
    #[error("Generation failed: {0}")]
    Failure(#[from] LlmError),

    /// The backend answered with text that is not JSON.
    #[error("Malformed response: {reason}. Content starts with: '{preview}'")]
    Malformed { reason: String, preview: String },

    /// The backend did not answer within the per-task deadline.
    #[error("Generation timed out after {0:?}")]
    Timeout(Duration),
}

impl GenerationError {
    /// Whether the orchestrator may retry the task.
    pub fn is_transient(&self) -> bool {
        match self {
            GenerationError::Failure(err) => err.is_transient(),
            GenerationError::Timeout(_) => true,
            GenerationError::Malformed { .. } => false,
        }
    }
}

/// Errors that can occur in the artifact store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Artifact not found: {condition} #{sequence} ({kind})")]
    NotFound {
        condition: Condition,
        sequence: u32,
        kind: &'static str,
    },

    #[error("Failed to create storage directory: {0}")]
    DirectoryCreationFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors that can occur while building fixtures and prompts.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("Invalid hobby count {requested}: must be between 1 and {available}")]
    InvalidHobbyCount { requested: usize, available: usize },

    #[error("Invalid sequence number 0: sequence numbers start at 1")]
    InvalidSequence,

    #[error("Tera template rendering error: {0}")]
    Tera(#[from] tera::Error),
}

/// Errors that abort an evaluation pass.
///
/// Per-artifact problems such as a missing or unparseable result are not
/// errors; they are logged and scored as zero.
#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("Prompt for {condition} #{sequence} does not contain 'a person named First Last,'")]
    NamePatternMissing { condition: Condition, sequence: u32 },

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
