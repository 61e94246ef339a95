//! Configuration loading and provider factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use perceptor_core::defaults::default_models;
use perceptor_core::model::ModelConfig;
use perceptor_core::traits::LlmProvider;

use crate::deepseek::DeepSeekProvider;
use crate::google::GoogleProvider;
use crate::mock::MockProvider;
use crate::openai::{OpenAiProvider, DEFAULT_CHAT_PATH};

/// Configuration for a single LLM provider.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    /// Any OpenAI-compatible chat-completions endpoint.
    OpenAI {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default = "default_chat_path")]
        chat_path: String,
        #[serde(default)]
        org_id: Option<String>,
    },
    DeepSeek {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
    },
    Google {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
    },
    /// Canned responses, for dry runs.
    Mock {
        #[serde(default)]
        response: Option<String>,
        #[serde(default)]
        json_response: Option<String>,
    },
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::OpenAI {
                api_key: _,
                base_url,
                chat_path,
                org_id,
            } => f
                .debug_struct("OpenAI")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .field("chat_path", chat_path)
                .field("org_id", org_id)
                .finish(),
            ProviderConfig::DeepSeek {
                api_key: _,
                base_url,
            } => f
                .debug_struct("DeepSeek")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .finish(),
            ProviderConfig::Google {
                api_key: _,
                base_url,
            } => f
                .debug_struct("Google")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .finish(),
            ProviderConfig::Mock {
                response,
                json_response,
            } => f
                .debug_struct("Mock")
                .field("response", response)
                .field("json_response", json_response)
                .finish(),
        }
    }
}

fn default_chat_path() -> String {
    DEFAULT_CHAT_PATH.to_string()
}

/// Top-level perceptor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerceptorConfig {
    /// Provider configurations keyed by name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// Model roster. Each entry names a provider key above.
    #[serde(default = "default_models")]
    pub models: Vec<ModelConfig>,
    /// Model id used for synthesis. Defaults to the first enabled model.
    #[serde(default)]
    pub synthesis_model: Option<String>,
    /// Provider key used by `perceptor quick`.
    #[serde(default = "default_quick_provider")]
    pub quick_provider: String,
    /// Max tokens per answer.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Max tokens for the synthesis call.
    #[serde(default = "default_synthesis_max_tokens")]
    pub synthesis_max_tokens: u32,
    /// Where projects and reports are persisted.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Where rendered reports are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_quick_provider() -> String {
    "openai".to_string()
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_synthesis_max_tokens() -> u32 {
    2048
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("./perceptor-data")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./perceptor-reports")
}

impl Default for PerceptorConfig {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            models: default_models(),
            synthesis_model: None,
            quick_provider: default_quick_provider(),
            max_tokens: default_max_tokens(),
            synthesis_max_tokens: default_synthesis_max_tokens(),
            data_dir: default_data_dir(),
            output_dir: default_output_dir(),
        }
    }
}

impl PerceptorConfig {
    pub fn enabled_models(&self) -> impl Iterator<Item = &ModelConfig> {
        self.models.iter().filter(|m| m.enabled)
    }

    pub fn find_model(&self, id: &str) -> Option<&ModelConfig> {
        self.models.iter().find(|m| m.id == id)
    }

    /// The configured synthesis model, if it names a known model.
    pub fn synthesis_model(&self) -> Option<ModelConfig> {
        let id = self.synthesis_model.as_deref()?;
        let found = self.find_model(id).cloned();
        if found.is_none() {
            tracing::warn!("synthesis model '{id}' is not in the model roster, using default");
        }
        found
    }

    /// Instantiate every provider referenced by `models`.
    ///
    /// Models naming an unconfigured provider are skipped here; the engine
    /// records their slots as failures.
    pub fn providers_for(&self, models: &[ModelConfig]) -> Result<HashMap<String, Arc<dyn LlmProvider>>> {
        let mut providers: HashMap<String, Arc<dyn LlmProvider>> = HashMap::new();
        for model in models {
            if providers.contains_key(&model.provider) {
                continue;
            }
            match self.providers.get(&model.provider) {
                Some(config) => {
                    let provider = create_provider(&model.provider, config)?;
                    providers.insert(model.provider.clone(), Arc::from(provider));
                }
                None => tracing::warn!(
                    model = %model.id,
                    "provider '{}' is not configured",
                    model.provider
                ),
            }
        }
        Ok(providers)
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    // Substituted values are copied verbatim and never rescanned.
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + end];
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

fn resolve_opt(s: &Option<String>) -> Option<String> {
    s.as_deref().map(resolve_env_vars)
}

/// Resolve env vars in a provider config.
fn resolve_provider_config(config: &ProviderConfig) -> ProviderConfig {
    match config {
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            chat_path,
            org_id,
        } => ProviderConfig::OpenAI {
            api_key: resolve_env_vars(api_key),
            base_url: resolve_opt(base_url),
            chat_path: resolve_env_vars(chat_path),
            org_id: resolve_opt(org_id),
        },
        ProviderConfig::DeepSeek { api_key, base_url } => ProviderConfig::DeepSeek {
            api_key: resolve_env_vars(api_key),
            base_url: resolve_opt(base_url),
        },
        ProviderConfig::Google { api_key, base_url } => ProviderConfig::Google {
            api_key: resolve_env_vars(api_key),
            base_url: resolve_opt(base_url),
        },
        ProviderConfig::Mock { .. } => config.clone(),
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `perceptor.toml` in the current directory
/// 2. `~/.config/perceptor/config.toml`
///
/// Environment variable overrides: `PERCEPTOR_OPENAI_KEY`,
/// `PERCEPTOR_GOOGLE_KEY`, `PERCEPTOR_DEEPSEEK_KEY`.
pub fn load_config() -> Result<PerceptorConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<PerceptorConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("perceptor.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|dir| dir.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            parse_config(&path)?
        }
        None => PerceptorConfig::default(),
    };

    apply_env_overrides(&mut config);

    config.providers = config
        .providers
        .iter()
        .map(|(k, v)| (k.clone(), resolve_provider_config(v)))
        .collect();

    Ok(config)
}

fn parse_config(path: &Path) -> Result<PerceptorConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    toml::from_str::<PerceptorConfig>(&content)
        .with_context(|| format!("failed to parse config: {}", path.display()))
}

fn apply_env_overrides(config: &mut PerceptorConfig) {
    if let Ok(key) = std::env::var("PERCEPTOR_OPENAI_KEY") {
        let entry = config
            .providers
            .entry("openai".into())
            .or_insert(ProviderConfig::OpenAI {
                api_key: String::new(),
                base_url: None,
                chat_path: default_chat_path(),
                org_id: None,
            });
        if let ProviderConfig::OpenAI { api_key, .. } = entry {
            *api_key = key;
        }
    }

    if let Ok(key) = std::env::var("PERCEPTOR_GOOGLE_KEY") {
        let entry = config
            .providers
            .entry("google".into())
            .or_insert(ProviderConfig::Google {
                api_key: String::new(),
                base_url: None,
            });
        if let ProviderConfig::Google { api_key, .. } = entry {
            *api_key = key;
        }
    }

    if let Ok(key) = std::env::var("PERCEPTOR_DEEPSEEK_KEY") {
        let entry = config
            .providers
            .entry("deepseek".into())
            .or_insert(ProviderConfig::DeepSeek {
                api_key: String::new(),
                base_url: None,
            });
        if let ProviderConfig::DeepSeek { api_key, .. } = entry {
            *api_key = key;
        }
    }
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("perceptor"))
}

fn require_key(name: &str, api_key: &str) -> Result<()> {
    if api_key.trim().is_empty() {
        anyhow::bail!(
            "provider '{name}' has no API key; set it in perceptor.toml or via PERCEPTOR_{}_KEY",
            name.to_uppercase()
        );
    }
    Ok(())
}

/// Create a provider instance from its configuration.
pub fn create_provider(name: &str, config: &ProviderConfig) -> Result<Box<dyn LlmProvider>> {
    match config {
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            chat_path,
            org_id,
        } => {
            require_key(name, api_key)?;
            Ok(Box::new(
                OpenAiProvider::new(api_key, base_url.clone(), org_id.clone()).with_chat_path(chat_path),
            ))
        }
        ProviderConfig::DeepSeek { api_key, base_url } => {
            require_key(name, api_key)?;
            Ok(Box::new(DeepSeekProvider::new(api_key, base_url.clone())))
        }
        ProviderConfig::Google { api_key, base_url } => {
            require_key(name, api_key)?;
            Ok(Box::new(GoogleProvider::new(api_key, base_url.clone())))
        }
        ProviderConfig::Mock {
            response,
            json_response,
        } => {
            let mut mock = MockProvider::with_fixed_response(
                response
                    .as_deref()
                    .unwrap_or("This product helps teams get work done."),
            );
            if let Some(body) = json_response {
                mock = mock.with_json_response(body);
            }
            Ok(Box::new(mock))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_PERCEPTOR_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_PERCEPTOR_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_PERCEPTOR_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        assert_eq!(resolve_env_vars("${_PERCEPTOR_UNSET_VAR}"), "");
        assert_eq!(resolve_env_vars("no close ${brace"), "no close ${brace");
        std::env::remove_var("_PERCEPTOR_TEST_VAR");
    }

    #[test]
    fn resolve_env_vars_does_not_expand_substituted_values() {
        std::env::set_var("_PERCEPTOR_SELF_REF", "${_PERCEPTOR_SELF_REF}");
        std::env::set_var("_PERCEPTOR_NESTED", "x${_PERCEPTOR_SELF_REF}y");
        assert_eq!(resolve_env_vars("${_PERCEPTOR_SELF_REF}"), "${_PERCEPTOR_SELF_REF}");
        assert_eq!(
            resolve_env_vars("a-${_PERCEPTOR_NESTED}-b"),
            "a-x${_PERCEPTOR_SELF_REF}y-b"
        );
        std::env::remove_var("_PERCEPTOR_SELF_REF");
        std::env::remove_var("_PERCEPTOR_NESTED");
    }

    #[test]
    fn default_config() {
        let config = PerceptorConfig::default();
        assert_eq!(config.quick_provider, "openai");
        assert_eq!(config.max_tokens, 1024);
        assert_eq!(config.models.len(), 4);
        assert_eq!(config.enabled_models().count(), 2);
        assert_eq!(config.data_dir, PathBuf::from("./perceptor-data"));
    }

    #[test]
    fn parse_provider_config() {
        let toml_str = r#"
synthesis_model = "gpt"

[providers.openai]
type = "openai"
api_key = "sk-openai"

[providers.gateway]
type = "openai"
api_key = "kw-key"
base_url = "https://api.keywordsai.co"
chat_path = "/api/chat/completions"

[providers.google]
type = "google"
api_key = "g-key"

[providers.deepseek]
type = "deepseek"
api_key = "ds-key"

[[models]]
id = "gpt"
name = "GPT-5 Mini"
provider = "openai"
model = "gpt-5-mini"

[[models]]
id = "flash"
name = "Gemini Flash"
provider = "google"
enabled = false
"#;
        let config: PerceptorConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.providers.len(), 4);
        assert!(matches!(
            config.providers.get("gateway"),
            Some(ProviderConfig::OpenAI { chat_path, .. }) if chat_path == "/api/chat/completions"
        ));
        assert!(matches!(
            config.providers.get("openai"),
            Some(ProviderConfig::OpenAI { chat_path, .. }) if chat_path == DEFAULT_CHAT_PATH
        ));
        assert_eq!(config.models.len(), 2);
        assert_eq!(config.models[0].temperature, 0.7);
        assert_eq!(config.synthesis_model().unwrap().wire_model(), "gpt-5-mini");
    }

    #[test]
    fn debug_masks_keys() {
        let config = ProviderConfig::Google {
            api_key: "super-secret".into(),
            base_url: None,
        };
        let printed = format!("{config:?}");
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("***"));
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let err = load_config_from(Some(Path::new("/nonexistent/perceptor.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn explicit_path_resolves_env_references() {
        std::env::set_var("_PERCEPTOR_TEST_GOOGLE", "from-env");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("perceptor.toml");
        std::fs::write(
            &path,
            "[providers.google]\ntype = \"google\"\napi_key = \"${_PERCEPTOR_TEST_GOOGLE}\"\n",
        )
        .unwrap();

        let config = load_config_from(Some(&path)).unwrap();
        assert!(matches!(
            config.providers.get("google"),
            Some(ProviderConfig::Google { api_key, .. }) if api_key == "from-env"
        ));
        std::env::remove_var("_PERCEPTOR_TEST_GOOGLE");
    }

    #[test]
    fn empty_key_is_rejected_by_factory() {
        let config = ProviderConfig::OpenAI {
            api_key: String::new(),
            base_url: None,
            chat_path: default_chat_path(),
            org_id: None,
        };
        let err = create_provider("openai", &config).err().unwrap();
        assert!(err.to_string().contains("PERCEPTOR_OPENAI_KEY"));
    }

    #[test]
    fn providers_for_skips_unconfigured() {
        let mut config = PerceptorConfig::default();
        config.providers.insert(
            "openai".into(),
            ProviderConfig::Mock {
                response: None,
                json_response: None,
            },
        );
        let models: Vec<ModelConfig> = config.enabled_models().cloned().collect();
        let providers = config.providers_for(&models).unwrap();
        assert_eq!(providers.len(), 1);
        assert!(providers.contains_key("openai"));
        assert!(!providers.contains_key("google"));
    }
}
