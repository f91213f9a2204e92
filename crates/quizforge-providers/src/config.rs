//! Configuration loading and provider factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use quizforge_core::traits::LlmProvider;

use crate::mock::MockProvider;
use crate::openai::OpenAiProvider;

/// Configuration for a single LLM provider.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    Groq {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
    },
    OpenAI {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        org_id: Option<String>,
    },
    /// Offline provider returning canned content.
    Mock {
        /// Inline response text.
        #[serde(default)]
        response: Option<String>,
        /// File whose content is returned; wins over `response`.
        #[serde(default)]
        fixture: Option<PathBuf>,
    },
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::Groq {
                api_key: _,
                base_url,
            } => f
                .debug_struct("Groq")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .finish(),
            ProviderConfig::OpenAI {
                api_key: _,
                base_url,
                org_id,
            } => f
                .debug_struct("OpenAI")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .field("org_id", org_id)
                .finish(),
            ProviderConfig::Mock { response, fixture } => f
                .debug_struct("Mock")
                .field("response", &response.as_ref().map(|r| r.len()))
                .field("fixture", fixture)
                .finish(),
        }
    }
}

/// Top-level quizforge configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct QuizforgeConfig {
    /// Provider configurations keyed by name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// Default provider to use.
    #[serde(default = "default_provider")]
    pub default_provider: String,
    /// Default model to use.
    #[serde(default = "default_model")]
    pub default_model: String,
    #[serde(default = "default_temperature")]
    pub default_temperature: f64,
    /// Max retries on provider errors.
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    /// Max concurrent generations.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Where generated documents and reports are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Where submission records are written.
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
    /// Base URL of the document API.
    #[serde(default)]
    pub document_api: Option<String>,
    /// Bearer token for the document API.
    #[serde(default)]
    pub api_token: Option<String>,
}

impl std::fmt::Debug for QuizforgeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuizforgeConfig")
            .field("providers", &self.providers)
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("max_retries", &self.max_retries)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("parallelism", &self.parallelism)
            .field("output_dir", &self.output_dir)
            .field("results_dir", &self.results_dir)
            .field("document_api", &self.document_api)
            .field("api_token", &self.api_token.as_ref().map(|_| "***"))
            .finish()
    }
}

fn default_provider() -> String {
    "groq".to_string()
}
fn default_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}
fn default_temperature() -> f64 {
    0.7
}
fn default_retries() -> u32 {
    3
}
fn default_retry_delay() -> u64 {
    1000
}
fn default_parallelism() -> usize {
    4
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./quizforge-output")
}
fn default_results_dir() -> PathBuf {
    PathBuf::from("./quizforge-output/submissions")
}

impl Default for QuizforgeConfig {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            max_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
            parallelism: default_parallelism(),
            output_dir: default_output_dir(),
            results_dir: default_results_dir(),
            document_api: None,
            api_token: None,
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Unset variables resolve to the empty string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + len];
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + len + 1..];
    }
    result.push_str(rest);
    result
}

fn resolve_opt(value: &Option<String>) -> Option<String> {
    value.as_deref().map(resolve_env_vars)
}

fn resolve_provider_config(config: &ProviderConfig) -> ProviderConfig {
    match config {
        ProviderConfig::Groq { api_key, base_url } => ProviderConfig::Groq {
            api_key: resolve_env_vars(api_key),
            base_url: resolve_opt(base_url),
        },
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            org_id,
        } => ProviderConfig::OpenAI {
            api_key: resolve_env_vars(api_key),
            base_url: resolve_opt(base_url),
            org_id: resolve_opt(org_id),
        },
        ProviderConfig::Mock { response, fixture } => ProviderConfig::Mock {
            response: response.clone(),
            fixture: fixture.clone(),
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `quizforge.toml` in the current directory
/// 2. `~/.config/quizforge/config.toml`
///
/// Environment variable overrides: `QUIZFORGE_GROQ_KEY`, `QUIZFORGE_OPENAI_KEY`.
pub fn load_config() -> Result<QuizforgeConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<QuizforgeConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("quizforge.toml");
            if local.exists() {
                Some(local)
            } else {
                config_home()
                    .map(|dir| dir.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<QuizforgeConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => QuizforgeConfig::default(),
    };

    if let Ok(key) = std::env::var("QUIZFORGE_GROQ_KEY") {
        match config.providers.get_mut("groq") {
            Some(ProviderConfig::Groq { api_key, .. }) => *api_key = key,
            _ => {
                config.providers.insert(
                    "groq".into(),
                    ProviderConfig::Groq {
                        api_key: key,
                        base_url: None,
                    },
                );
            }
        }
    }

    if let Ok(key) = std::env::var("QUIZFORGE_OPENAI_KEY") {
        match config.providers.get_mut("openai") {
            Some(ProviderConfig::OpenAI { api_key, .. }) => *api_key = key,
            _ => {
                config.providers.insert(
                    "openai".into(),
                    ProviderConfig::OpenAI {
                        api_key: key,
                        base_url: None,
                        org_id: None,
                    },
                );
            }
        }
    }

    config.providers = config
        .providers
        .iter()
        .map(|(k, v)| (k.clone(), resolve_provider_config(v)))
        .collect();
    config.document_api = resolve_opt(&config.document_api);
    config.api_token = resolve_opt(&config.api_token).filter(|t| !t.is_empty());

    Ok(config)
}

fn config_home() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("quizforge"))
}

/// Create a provider instance from its configuration.
pub fn create_provider(name: &str, config: &ProviderConfig) -> Result<Box<dyn LlmProvider>> {
    match config {
        ProviderConfig::Groq { api_key, base_url } => {
            anyhow::ensure!(!api_key.is_empty(), "provider '{name}' has no API key");
            Ok(Box::new(OpenAiProvider::groq(api_key, base_url.clone())?))
        }
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            org_id,
        } => {
            anyhow::ensure!(!api_key.is_empty(), "provider '{name}' has no API key");
            Ok(Box::new(OpenAiProvider::new(
                api_key,
                base_url.clone(),
                org_id.clone(),
            )?))
        }
        ProviderConfig::Mock { response, fixture } => {
            let provider = match (fixture, response) {
                (Some(path), _) => {
                    let content = std::fs::read_to_string(path).with_context(|| {
                        format!("failed to read mock fixture: {}", path.display())
                    })?;
                    MockProvider::with_fixed_response(&content)
                }
                (None, Some(text)) => MockProvider::with_fixed_response(text),
                (None, None) => MockProvider::default(),
            };
            Ok(Box::new(provider))
        }
    }
}
