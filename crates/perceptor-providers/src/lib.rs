//! perceptor-providers: LLM provider integrations.
//!
//! Implements the `LlmProvider` trait for OpenAI-compatible endpoints,
//! DeepSeek, and Google Gemini, plus a mock for dry runs, and builds them
//! from `perceptor.toml`.

pub mod config;
pub mod deepseek;
pub mod error;
pub mod google;
pub mod mock;
pub mod openai;

pub use config::{create_provider, load_config, load_config_from, PerceptorConfig, ProviderConfig};
pub use error::ProviderError;
