//! Mock provider for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use perceptor_core::traits::{
    CompletionRequest, CompletionResponse, LlmProvider, ModelInfo, TokenUsage,
};

use crate::error::ProviderError;

/// A mock LLM provider for exercising the audit engine without real API
/// calls.
///
/// Responses are chosen by matching substrings of the user prompt; JSON
/// mode requests get the synthesis response instead.
pub struct MockProvider {
    /// Map of prompt substring → response text.
    responses: HashMap<String, String>,
    /// Default response if no prompt matches.
    default_response: String,
    /// Returned for `json_response` requests.
    json_response: Option<String>,
    /// Models that fail with an HTTP 500.
    failing_models: Vec<String>,
    call_count: AtomicU32,
    last_request: Mutex<Option<CompletionRequest>>,
}

impl MockProvider {
    /// Create a new mock provider with the given prompt→response mappings.
    pub fn new(responses: HashMap<String, String>) -> Self {
        Self {
            responses,
            default_response: "This product helps teams get work done.".to_string(),
            json_response: None,
            failing_models: Vec::new(),
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Create a mock that always returns the same response.
    pub fn with_fixed_response(response: &str) -> Self {
        let mut mock = Self::new(HashMap::new());
        mock.default_response = response.to_string();
        mock
    }

    /// Answer JSON-mode requests with `body`.
    pub fn with_json_response(mut self, body: &str) -> Self {
        self.json_response = Some(body.to_string());
        self
    }

    /// Make every request for `model` fail.
    pub fn failing_for(mut self, model: &str) -> Self {
        self.failing_models.push(model.to_string());
        self
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<CompletionResponse> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self
            .last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(request.clone());

        if self.failing_models.contains(&request.model) {
            return Err(ProviderError::ApiError {
                status: 500,
                message: format!("mock failure for {}", request.model),
            }
            .into());
        }

        let json = request
            .json_response
            .then(|| self.json_response.clone())
            .flatten();
        let content = json.unwrap_or_else(|| {
            self.responses
                .iter()
                .find(|(key, _)| request.prompt.contains(key.as_str()))
                .map(|(_, v)| v.clone())
                .unwrap_or_else(|| self.default_response.clone())
        });

        // Rough estimate: four characters per token.
        let prompt_tokens = (request.prompt.len() / 4) as u32;
        let completion_tokens = (content.len() / 4) as u32;

        Ok(CompletionResponse {
            content,
            model: request.model.clone(),
            token_usage: TokenUsage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            },
            latency_ms: 1,
        })
    }

    fn available_models(&self) -> Vec<ModelInfo> {
        vec![ModelInfo {
            id: "mock-model".into(),
            name: "Mock Model".into(),
            provider: "mock".into(),
            max_context: 100_000,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(prompt: &str, json_response: bool) -> CompletionRequest {
        CompletionRequest {
            model: "mock".into(),
            system_prompt: None,
            prompt: prompt.into(),
            max_tokens: 100,
            temperature: 0.7,
            json_response,
        }
    }

    #[tokio::test]
    async fn fixed_response() {
        let provider = MockProvider::with_fixed_response("Acme is a planner.");
        let response = provider.complete(&request("anything", false)).await.unwrap();
        assert_eq!(response.content, "Acme is a planner.");
        assert_eq!(provider.call_count(), 1);
        assert_eq!(provider.last_request().unwrap().prompt, "anything");
    }

    #[tokio::test]
    async fn prompt_matching() {
        let mut responses = HashMap::new();
        responses.insert("pricing".to_string(), "Plans start at $10.".to_string());
        responses.insert("competitors".to_string(), "Unlike Globex, ...".to_string());
        let provider = MockProvider::new(responses);

        let resp = provider
            .complete(&request("What is the pricing model?", false))
            .await
            .unwrap();
        assert_eq!(resp.content, "Plans start at $10.");

        let resp = provider
            .complete(&request("Who is it for?", false))
            .await
            .unwrap();
        assert!(resp.content.contains("helps teams"));
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn json_mode_and_failures() {
        let provider = MockProvider::with_fixed_response("text")
            .with_json_response(r#"{"summary": "s"}"#)
            .failing_for("broken");

        let resp = provider.complete(&request("synthesize", true)).await.unwrap();
        assert_eq!(resp.content, r#"{"summary": "s"}"#);

        let mut broken = request("hi", false);
        broken.model = "broken".into();
        let err = provider.complete(&broken).await.unwrap_err();
        assert!(err.to_string().contains("HTTP 500"));
    }
}
