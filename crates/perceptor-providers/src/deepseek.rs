//! DeepSeek provider.
//!
//! DeepSeek speaks the OpenAI chat format at its own host and path, and
//! still expects `max_tokens`.

use async_trait::async_trait;

use perceptor_core::traits::{CompletionRequest, CompletionResponse, LlmProvider, ModelInfo};

use crate::openai::OpenAiProvider;

pub(crate) const DEFAULT_BASE_URL: &str = "https://api.deepseek.com";
const CHAT_PATH: &str = "/chat/completions";

/// DeepSeek API provider.
pub struct DeepSeekProvider(OpenAiProvider);

impl DeepSeekProvider {
    pub fn new(api_key: &str, base_url: Option<String>) -> Self {
        let inner = OpenAiProvider::new(
            api_key,
            Some(base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string())),
            None,
        )
        .with_chat_path(CHAT_PATH)
        .with_name("deepseek")
        .with_legacy_max_tokens();
        Self(inner)
    }
}

#[async_trait]
impl LlmProvider for DeepSeekProvider {
    fn name(&self) -> &str {
        self.0.name()
    }

    async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<CompletionResponse> {
        self.0.complete(request).await
    }

    fn available_models(&self) -> Vec<ModelInfo> {
        vec![
            ModelInfo {
                id: "deepseek-chat".into(),
                name: "DeepSeek Chat".into(),
                provider: "deepseek".into(),
                max_context: 128_000,
            },
            ModelInfo {
                id: "deepseek-reasoner".into(),
                name: "DeepSeek Reasoner".into(),
                provider: "deepseek".into(),
                max_context: 128_000,
            },
        ]
    }
}
