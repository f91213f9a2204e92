//! Mock provider for offline runs and tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use quizforge_core::traits::{
    GenerateRequest, GenerateResponse, LlmProvider, ModelInfo, TokenUsage,
};

/// Returned when no prompt mapping matches and no fixed response is set.
const SAMPLE_TEST: &str = "\
1. Which planet is closest to the Sun?
A. Venus
B. Mercury [CORRECT]
C. Mars
D. Earth
2. What is the chemical symbol for water?
A. H2O [CORRECT]
B. CO2
C. O2
D. NaCl
3. Describe the water cycle and its main stages.
Write at least 100 words.";

/// A mock LLM provider that answers without network access.
///
/// Returns configurable responses based on prompt content matching.
pub struct MockProvider {
    /// Map of prompt substring → response content.
    responses: HashMap<String, String>,
    /// Response if no prompt matches.
    default_response: String,
    call_count: AtomicU32,
    last_request: Mutex<Option<GenerateRequest>>,
}

impl MockProvider {
    /// Create a mock with prompt→response mappings.
    pub fn new(responses: HashMap<String, String>) -> Self {
        Self {
            responses,
            default_response: SAMPLE_TEST.to_string(),
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Create a mock that always returns the same response.
    pub fn with_fixed_response(response: &str) -> Self {
        Self {
            default_response: response.to_string(),
            ..Self::new(HashMap::new())
        }
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn last_request(&self) -> Option<GenerateRequest> {
        self.last_request
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new(HashMap::new())
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }

        let content = self
            .responses
            .iter()
            .find(|(key, _)| request.prompt.contains(key.as_str()))
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| self.default_response.clone());

        // Rough estimate: four characters per token.
        let prompt_tokens = (request.prompt.len() / 4) as u32;
        let completion_tokens = (content.len() / 4) as u32;

        Ok(GenerateResponse {
            content,
            model: request.model.clone(),
            token_usage: TokenUsage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
                estimated_cost_usd: 0.0,
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
            cost_per_1k_input: 0.0,
            cost_per_1k_output: 0.0,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizforge_core::parser::parse;

    fn request(prompt: &str) -> GenerateRequest {
        GenerateRequest {
            model: "mock-model".into(),
            prompt: prompt.into(),
            system_prompt: None,
            max_tokens: 100,
            temperature: 0.0,
        }
    }

    #[tokio::test]
    async fn fixed_response() {
        let provider = MockProvider::with_fixed_response("1. Q?\nA. yes [CORRECT]");
        let response = provider.generate(&request("anything")).await.unwrap();
        assert_eq!(response.content, "1. Q?\nA. yes [CORRECT]");
        assert_eq!(provider.call_count(), 1);
        assert_eq!(provider.last_request().unwrap().prompt, "anything");
    }

    #[tokio::test]
    async fn prompt_matching() {
        let mut responses = HashMap::new();
        responses.insert(
            "fractions".to_string(),
            "1. What is 1/2 of 4?\nA. 2 [CORRECT]\nB. 8".to_string(),
        );
        responses.insert(
            "rivers".to_string(),
            "1. Describe the course of the Nile river.".to_string(),
        );
        let provider = MockProvider::new(responses);

        let resp = provider
            .generate(&request("a test about fractions"))
            .await
            .unwrap();
        assert!(resp.content.contains("1/2"));

        let resp = provider.generate(&request("a test about rivers")).await.unwrap();
        assert!(resp.content.contains("Nile"));
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn default_response_parses() {
        let provider = MockProvider::default();
        let resp = provider.generate(&request("anything")).await.unwrap();
        let questions = parse(&resp.content);
        assert_eq!(questions.len(), 3);
        assert_eq!(questions.iter().filter(|q| q.is_gradable()).count(), 2);
    }
}
