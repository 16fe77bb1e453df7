//! Story generation adapter.
//!
//! Sends a rendered prompt to an [`LlmProvider`] and turns the reply into a
//! JSON document. The adapter makes exactly one backend call per request.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use super::litellm::{GenerationRequest, LlmProvider, Message};
use crate::error::{GenerationError, LlmError};
use crate::utils::{extract_json_from_response, preview};

/// Characters of the reply kept in a malformed-response error.
const PREVIEW_CHARS: usize = 200;

/// Per-call generation options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Model identifier; `None` uses the backend default.
    pub model: Option<String>,
}

impl GenerateOptions {
    pub fn with_model(model: impl Into<String>) -> Self {
        Self {
            model: Some(model.into()),
        }
    }
}

/// Produces structured story documents from prompts.
#[derive(Clone)]
pub struct StoryGenerator {
    provider: Arc<dyn LlmProvider>,
}

impl StoryGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    /// Generates one document for `prompt`.
    ///
    /// # Errors
    ///
    /// - [`GenerationError::Failure`] when the backend call fails or returns
    ///   no content.
    /// - [`GenerationError::Malformed`] when the reply is not JSON.
    pub async fn generate(
        &self,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<Value, GenerationError> {
        let request = GenerationRequest::new(
            options.model.clone().unwrap_or_default(),
            vec![Message::user(prompt)],
        )
        .with_json_output();

        let response = self.provider.generate(request).await?;
        let content = response
            .first_content()
            .ok_or(GenerationError::Failure(LlmError::EmptyResponse))?;

        debug!(
            model = %response.model,
            total_tokens = response.usage.total_tokens,
            content_len = content.len(),
            "Received story reply"
        );

        parse_document(content)
    }
}

/// Parses a reply into JSON after stripping fences and surrounding prose.
pub fn parse_document(content: &str) -> Result<Value, GenerationError> {
    let json_content = extract_json_from_response(content);
    serde_json::from_str(&json_content).map_err(|err| GenerationError::Malformed {
        reason: err.to_string(),
        preview: preview(content, PREVIEW_CHARS),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::litellm::{Choice, GenerationResponse, Usage};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct FixedProvider {
        reply: Result<Option<String>, u16>,
        seen: Mutex<Vec<GenerationRequest>>,
    }

    impl FixedProvider {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(Some(text.to_string())),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for FixedProvider {
        async fn generate(
            &self,
            request: GenerationRequest,
        ) -> Result<GenerationResponse, LlmError> {
            self.seen.lock().expect("lock").push(request);
            match &self.reply {
                Ok(content) => Ok(GenerationResponse {
                    id: "r1".to_string(),
                    model: "test-model".to_string(),
                    choices: content
                        .iter()
                        .map(|c| Choice {
                            index: 0,
                            message: Message::assistant(c.clone()),
                            finish_reason: "stop".to_string(),
                        })
                        .collect(),
                    usage: Usage::default(),
                }),
                Err(code) => Err(LlmError::ApiError {
                    code: *code,
                    message: "boom".to_string(),
                }),
            }
        }
    }

    #[tokio::test]
    async fn test_generate_sends_single_json_request() {
        let provider = Arc::new(FixedProvider::replying(r#"{"title": "Hi"}"#));
        let generator = StoryGenerator::new(provider.clone());

        let doc = generator
            .generate("write a story", &GenerateOptions::with_model("gpt-4o"))
            .await
            .expect("generate");
        assert_eq!(doc, json!({"title": "Hi"}));

        let seen = provider.seen.lock().expect("lock");
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].model, "gpt-4o");
        assert_eq!(seen[0].messages, vec![Message::user("write a story")]);
        assert!(seen[0].response_format.is_some());
    }

    #[tokio::test]
    async fn test_generate_default_model_is_empty() {
        let provider = Arc::new(FixedProvider::replying("{}"));
        let generator = StoryGenerator::new(provider.clone());
        generator
            .generate("p", &GenerateOptions::default())
            .await
            .expect("generate");
        assert_eq!(provider.seen.lock().expect("lock")[0].model, "");
    }

    #[tokio::test]
    async fn test_generate_strips_code_fences() {
        let provider = Arc::new(FixedProvider::replying(
            "Here you go:\n```json\n{\"story\": []}\n```",
        ));
        let doc = StoryGenerator::new(provider)
            .generate("p", &GenerateOptions::default())
            .await
            .expect("generate");
        assert_eq!(doc, json!({"story": []}));
    }

    #[tokio::test]
    async fn test_generate_malformed_reply() {
        let provider = Arc::new(FixedProvider::replying("Once upon a time"));
        let err = StoryGenerator::new(provider)
            .generate("p", &GenerateOptions::default())
            .await
            .unwrap_err();
        match err {
            GenerationError::Malformed { preview, .. } => assert_eq!(preview, "Once upon a time"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_generate_backend_failure() {
        let provider = Arc::new(FixedProvider {
            reply: Err(401),
            seen: Mutex::new(Vec::new()),
        });
        let err = StoryGenerator::new(provider)
            .generate("p", &GenerateOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GenerationError::Failure(LlmError::ApiError { code: 401, .. })
        ));
    }

    #[tokio::test]
    async fn test_generate_no_choices() {
        let provider = Arc::new(FixedProvider {
            reply: Ok(None),
            seen: Mutex::new(Vec::new()),
        });
        let err = StoryGenerator::new(provider)
            .generate("p", &GenerateOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Failure(LlmError::EmptyResponse)));
    }
}
