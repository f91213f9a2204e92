//! Test generation engine.
//!
//! Sends generation prompts to a provider with retries, parses what comes
//! back, and runs whole plans with bounded parallelism.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::error::ProviderError;
use crate::model::{Document, InteractiveSettings};
use crate::parser::parse_detailed;
use crate::prompt::{build_prompt, TestSpec, DEFAULT_SYSTEM_PROMPT};
use crate::report::{GeneratedDocument, GenerationFailure, GenerationReport};
use crate::traits::{GenerateRequest, GenerateResponse, LlmProvider, TokenUsage};

/// Longest pause between two retries.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Configuration for the generation engine.
#[derive(Debug, Clone)]
pub struct GenerationEngineConfig {
    /// Maximum concurrent generations.
    pub parallelism: usize,
    /// Temperature for generation.
    pub temperature: f64,
    /// Max tokens for generation.
    pub max_tokens: u32,
    /// Retries on provider errors (not on unparseable output).
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub retry_delay: Duration,
    /// Optional system prompt override.
    pub system_prompt_override: Option<String>,
}

impl Default for GenerationEngineConfig {
    fn default() -> Self {
        Self {
            parallelism: 4,
            temperature: 0.7,
            max_tokens: 4096,
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            system_prompt_override: None,
        }
    }
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_generation_start(&self, spec_id: &str);
    fn on_generation_complete(&self, generated: &GeneratedDocument);
    fn on_generation_error(&self, spec_id: &str, error: &str);
    fn on_batch_complete(&self, total: usize, completed: usize, failed: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_generation_start(&self, _: &str) {}
    fn on_generation_complete(&self, _: &GeneratedDocument) {}
    fn on_generation_error(&self, _: &str, _: &str) {}
    fn on_batch_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
}

/// Drives one provider/model pair.
pub struct GenerationEngine {
    provider: Arc<dyn LlmProvider>,
    model: String,
    config: GenerationEngineConfig,
}

impl GenerationEngine {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        model: impl Into<String>,
        config: GenerationEngineConfig,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            config,
        }
    }

    /// Generate one test document.
    pub async fn generate(&self, spec: &TestSpec) -> Result<GeneratedDocument> {
        spec.validate()?;

        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: build_prompt(spec),
            system_prompt: Some(
                self.config
                    .system_prompt_override
                    .clone()
                    .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            ),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let (response, attempts) = self.generate_with_retries(&spec.id, &request).await?;
        into_generated_document(spec, response, attempts)
    }

    /// Call the provider, retrying transient failures with exponential backoff.
    async fn generate_with_retries(
        &self,
        spec_id: &str,
        request: &GenerateRequest,
    ) -> Result<(GenerateResponse, u32)> {
        let mut last_error = None;
        let mut retry_delay = self.config.retry_delay;

        for retry in 0..=self.config.max_retries {
            if retry > 0 {
                tokio::time::sleep(retry_delay).await;
                retry_delay = (retry_delay * 2).min(MAX_RETRY_DELAY);
            }
            match self.provider.generate(request).await {
                Ok(response) => return Ok((response, retry + 1)),
                Err(e) => {
                    if let Some(provider_error) = e.downcast_ref::<ProviderError>() {
                        if provider_error.is_permanent() {
                            return Err(e);
                        }
                        // Use provider's retry-after hint if available
                        if let Some(ms) = provider_error.retry_after_ms() {
                            retry_delay = Duration::from_millis(ms);
                        }
                    }
                    tracing::warn!(spec = spec_id, attempt = retry + 1, "generation failed: {e:#}");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("unknown error")))
    }

    /// Generate every spec, at most `parallelism` at a time.
    pub async fn generate_batch(
        &self,
        specs: &[TestSpec],
        progress: &dyn ProgressReporter,
    ) -> Result<GenerationReport> {
        let start = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.config.parallelism.max(1)));

        let mut futures = FuturesUnordered::new();
        for (index, spec) in specs.iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            futures.push(async move {
                let result: Result<GeneratedDocument> = async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|_| anyhow::anyhow!("semaphore closed"))?;
                    progress.on_generation_start(&spec.id);
                    self.generate(spec).await
                }
                .await;
                (index, spec.id.clone(), result)
            });
        }

        let total = futures.len();
        let mut documents = Vec::new();
        let mut failures = Vec::new();

        while let Some((index, spec_id, result)) = futures.next().await {
            match result {
                Ok(generated) => {
                    progress.on_generation_complete(&generated);
                    documents.push((index, generated));
                }
                Err(e) => {
                    tracing::error!("generation failed for {spec_id}: {e:#}");
                    progress.on_generation_error(&spec_id, &format!("{e:#}"));
                    failures.push((
                        index,
                        GenerationFailure {
                            spec_id,
                            error: format!("{e:#}"),
                        },
                    ));
                }
            }
        }

        // Report in plan order rather than completion order.
        documents.sort_by_key(|(index, _)| *index);
        failures.sort_by_key(|(index, _)| *index);
        let documents: Vec<GeneratedDocument> = documents.into_iter().map(|(_, d)| d).collect();
        let failures: Vec<GenerationFailure> = failures.into_iter().map(|(_, f)| f).collect();

        let mut token_usage = TokenUsage::default();
        for generated in &documents {
            token_usage.add(&generated.token_usage);
        }

        let elapsed = start.elapsed();
        progress.on_batch_complete(total, documents.len(), failures.len(), elapsed);

        Ok(GenerationReport {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            provider: self.provider.name().to_string(),
            model: self.model.clone(),
            documents,
            failures,
            token_usage,
            duration_ms: elapsed.as_millis() as u64,
        })
    }
}

/// Wrap a provider response into a document, rejecting unusable output.
fn into_generated_document(
    spec: &TestSpec,
    response: GenerateResponse,
    attempts: u32,
) -> Result<GeneratedDocument> {
    let outcome = parse_detailed(&response.content);
    if outcome.questions.is_empty() {
        anyhow::bail!(
            "model returned no parseable questions for '{}' ({} chars of output)",
            spec.id,
            response.content.len()
        );
    }
    if outcome.questions.len() < spec.question_count as usize {
        tracing::warn!(
            spec = %spec.id,
            requested = spec.question_count,
            parsed = outcome.questions.len(),
            "fewer questions than requested"
        );
    }

    let document = Document {
        id: Uuid::new_v4().to_string(),
        title: spec.title.clone(),
        content: response.content,
        is_interactive: true,
        interactive_settings: InteractiveSettings {
            time_limit: spec.time_limit,
            allow_retry: spec.allow_retry,
        },
        created_at: Some(Utc::now()),
    };

    Ok(GeneratedDocument {
        spec_id: spec.id.clone(),
        question_count: outcome.questions.len(),
        dropped_questions: outcome.dropped.len(),
        document,
        token_usage: response.token_usage,
        latency_ms: response.latency_ms,
        attempts,
    })
}
