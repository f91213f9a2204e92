//! OpenAI-compatible chat completions provider (OpenAI and Groq).

use std::time::Instant;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use quizforge_core::prompt::DEFAULT_SYSTEM_PROMPT;
use quizforge_core::traits::{
    GenerateRequest, GenerateResponse, LlmProvider, ModelInfo, TokenUsage,
};

use crate::error::ProviderError;

const OPENAI_BASE_URL: &str = "https://api.openai.com";
const GROQ_BASE_URL: &str = "https://api.groq.com/openai";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Which hosted API the provider talks to; decides the name and model list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flavor {
    OpenAi,
    Groq,
}

/// OpenAI-compatible API provider.
pub struct OpenAiProvider {
    flavor: Flavor,
    api_key: String,
    base_url: String,
    org_id: Option<String>,
    client: reqwest::Client,
}

impl OpenAiProvider {
    /// Provider for the OpenAI API, or any compatible endpoint via `base_url`.
    pub fn new(
        api_key: &str,
        base_url: Option<String>,
        org_id: Option<String>,
    ) -> anyhow::Result<Self> {
        Self::build(
            Flavor::OpenAi,
            api_key,
            base_url.unwrap_or_else(|| OPENAI_BASE_URL.to_string()),
            org_id,
        )
    }

    /// Provider for Groq's OpenAI-compatible endpoint.
    pub fn groq(api_key: &str, base_url: Option<String>) -> anyhow::Result<Self> {
        Self::build(
            Flavor::Groq,
            api_key,
            base_url.unwrap_or_else(|| GROQ_BASE_URL.to_string()),
            None,
        )
    }

    fn build(
        flavor: Flavor,
        api_key: &str,
        base_url: String,
        org_id: Option<String>,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            flavor,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            org_id,
            client,
        })
    }

    fn estimate_cost(&self, model: &str, usage: &OpenAiUsage) -> f64 {
        self.available_models()
            .iter()
            .find(|m| m.id == model)
            .map(|m| m.estimate_cost(usage.prompt_tokens, usage.completion_tokens))
            .unwrap_or(0.0)
    }
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    messages: Vec<OpenAiMessage<'a>>,
}

#[derive(Serialize)]
struct OpenAiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: OpenAiUsage,
    model: String,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiChoiceMessage,
}

#[derive(Deserialize)]
struct OpenAiChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize, Default)]
struct OpenAiUsage {
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
        match self.flavor {
            Flavor::OpenAi => "openai",
            Flavor::Groq => "groq",
        }
    }

    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse> {
        let start = Instant::now();

        let system_prompt = request
            .system_prompt
            .as_deref()
            .unwrap_or(DEFAULT_SYSTEM_PROMPT);

        let body = OpenAiRequest {
            model: &request.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: vec![
                OpenAiMessage {
                    role: "system",
                    content: system_prompt,
                },
                OpenAiMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
        };

        let mut req = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json");

        if let Some(org) = &self.org_id {
            req = req.header("OpenAI-Organization", org);
        }

        let response = req.json(&body).send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(DEFAULT_TIMEOUT_SECS)
            } else {
                ProviderError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        match status {
            429 => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse::<f64>().ok())
                    .map(|secs| (secs * 1000.0).ceil() as u64)
                    .unwrap_or(5000);
                return Err(ProviderError::RateLimited {
                    retry_after_ms: retry_after,
                }
                .into());
            }
            401 => {
                let body = response.text().await.unwrap_or_default();
                return Err(ProviderError::AuthenticationFailed(body).into());
            }
            404 => {
                return Err(ProviderError::ModelNotFound(request.model.clone()).into());
            }
            s if s >= 400 => {
                let body = response.text().await.unwrap_or_default();
                return Err(ProviderError::ApiError {
                    status,
                    message: body,
                }
                .into());
            }
            _ => {}
        }

        let api_response: OpenAiResponse =
            response
                .json()
                .await
                .map_err(|e| ProviderError::ApiError {
                    status: 0,
                    message: format!("failed to parse response: {e}"),
                })?;

        let latency_ms = start.elapsed().as_millis() as u64;
        let content = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        let usage = api_response.usage;
        let estimated_cost_usd = self.estimate_cost(&request.model, &usage);

        Ok(GenerateResponse {
            content,
            model: api_response.model,
            token_usage: TokenUsage {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
                estimated_cost_usd,
            },
            latency_ms,
        })
    }

    fn available_models(&self) -> Vec<ModelInfo> {
        match self.flavor {
            Flavor::Groq => vec![
                ModelInfo {
                    id: "llama-3.3-70b-versatile".into(),
                    name: "Llama 3.3 70B Versatile".into(),
                    provider: "groq".into(),
                    max_context: 128_000,
                    cost_per_1k_input: 0.00059,
                    cost_per_1k_output: 0.00079,
                },
                ModelInfo {
                    id: "llama-3.1-8b-instant".into(),
                    name: "Llama 3.1 8B Instant".into(),
                    provider: "groq".into(),
                    max_context: 128_000,
                    cost_per_1k_input: 0.00005,
                    cost_per_1k_output: 0.00008,
                },
                ModelInfo {
                    id: "deepseek-r1-distill-llama-70b".into(),
                    name: "DeepSeek R1 Distill Llama 70B".into(),
                    provider: "groq".into(),
                    max_context: 128_000,
                    cost_per_1k_input: 0.00075,
                    cost_per_1k_output: 0.00099,
                },
            ],
            Flavor::OpenAi => vec![
                ModelInfo {
                    id: "gpt-4.1".into(),
                    name: "GPT-4.1".into(),
                    provider: "openai".into(),
                    max_context: 1_000_000,
                    cost_per_1k_input: 0.002,
                    cost_per_1k_output: 0.008,
                },
                ModelInfo {
                    id: "gpt-4.1-mini".into(),
                    name: "GPT-4.1 Mini".into(),
                    provider: "openai".into(),
                    max_context: 1_000_000,
                    cost_per_1k_input: 0.0004,
                    cost_per_1k_output: 0.0016,
                },
            ],
        }
    }
}
