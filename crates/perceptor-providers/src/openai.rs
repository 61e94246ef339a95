//! OpenAI-compatible chat-completions provider.
//!
//! Works against OpenAI itself and any gateway exposing the same wire
//! format under a configurable path.

use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use perceptor_core::traits::{
    CompletionRequest, CompletionResponse, LlmProvider, ModelInfo, TokenUsage,
};

use crate::error::{check_status, ProviderError};

pub(crate) const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub(crate) const DEFAULT_CHAT_PATH: &str = "/v1/chat/completions";
pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// OpenAI-compatible API provider.
pub struct OpenAiProvider {
    name: String,
    api_key: String,
    base_url: String,
    chat_path: String,
    org_id: Option<String>,
    /// Send `max_tokens` instead of `max_completion_tokens`.
    legacy_max_tokens: bool,
    client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(api_key: &str, base_url: Option<String>, org_id: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("failed to build HTTP client");

        Self {
            name: "openai".to_string(),
            api_key: api_key.to_string(),
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            chat_path: DEFAULT_CHAT_PATH.to_string(),
            org_id,
            legacy_max_tokens: false,
            client,
        }
    }

    /// Override the endpoint path appended to the base URL.
    pub fn with_chat_path(mut self, path: &str) -> Self {
        self.chat_path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        self
    }

    pub(crate) fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub(crate) fn with_legacy_max_tokens(mut self) -> Self {
        self.legacy_max_tokens = true;
        self
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, self.chat_path)
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    temperature: f64,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: ChatUsage,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize, Default)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self, request), fields(provider = %self.name, model = %request.model))]
    async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<CompletionResponse> {
        let start = Instant::now();

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system_prompt {
            messages.push(ChatMessage {
                role: "system",
                content: system.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: request.prompt.clone(),
        });

        let (max_tokens, max_completion_tokens) = if self.legacy_max_tokens {
            (Some(request.max_tokens), None)
        } else {
            (None, Some(request.max_tokens))
        };

        let body = ChatRequest {
            model: request.model.clone(),
            max_tokens,
            max_completion_tokens,
            temperature: request.temperature,
            messages,
            response_format: request.json_response.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        let mut req = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json");

        if let Some(org) = &self.org_id {
            req = req.header("OpenAI-Organization", org);
        }

        let response = req
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::from_send(e, DEFAULT_TIMEOUT_SECS))?;
        let response = check_status(response, &request.model).await?;

        let api_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        let latency_ms = start.elapsed().as_millis() as u64;
        let content = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        tracing::debug!(latency_ms, chars = content.len(), "completion received");

        Ok(CompletionResponse {
            content,
            model: api_response.model.unwrap_or_else(|| request.model.clone()),
            token_usage: TokenUsage {
                prompt_tokens: api_response.usage.prompt_tokens,
                completion_tokens: api_response.usage.completion_tokens,
                total_tokens: api_response.usage.total_tokens,
            },
            latency_ms,
        })
    }

    fn available_models(&self) -> Vec<ModelInfo> {
        [
            ("gpt-5", "GPT-5", 400_000),
            ("gpt-5-mini", "GPT-5 Mini", 400_000),
            ("gpt-4o-mini", "GPT-4o Mini", 128_000),
        ]
        .into_iter()
        .map(|(id, name, max_context)| ModelInfo {
            id: id.into(),
            name: name.into(),
            provider: self.name.clone(),
            max_context,
        })
        .collect()
    }
}
