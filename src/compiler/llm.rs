//! Model invocation (spec.md §4.6 step 3): a minimal chat-completion
//! client, abstracted behind an [`LlmClient`] trait so the Compiler
//! never depends on a concrete vendor API and tests can inject a fixed
//! response instead of reaching the network.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::net;

/// `Call the configured LLM with low temperature (spec.md §4.6 step
/// 3)`. Implementations own their own retry/backoff; `complete`
/// surfaces a persistent failure as `EngineError::LlmUnavailable`.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, EngineError>;
}

/// Chat-completion client over `reqwest-middleware`, pointed at
/// `EngineConfig::llm_endpoint`. The wire shape is the common
/// `{model, temperature, messages: [{role, content}]}` chat-completions
/// convention; a deployment behind a different gateway only needs a
/// different `llm_endpoint` and response-shape adapter, not a new
/// trait.
pub struct HttpLlmClient {
    client: reqwest_middleware::ClientWithMiddleware,
    endpoint: String,
    model: String,
    temperature: f32,
}

impl HttpLlmClient {
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        // A small bounded retry budget is enough here; the Compiler
        // itself also retries once via the repair pass (spec.md §4.6
        // step 7), so this layer only needs to absorb transient
        // network blips, not schema failures.
        let client = net::retrying_client(config.llm_timeout, 2)?;
        Ok(Self {
            client,
            endpoint: config.llm_endpoint.clone(),
            model: config.llm_model_id.clone(),
            temperature: config.llm_temperature,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, prompt: &str) -> Result<String, EngineError> {
        let body = json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [{"role": "user", "content": prompt}],
        });

        debug!(model = %self.model, "invoking compiler llm");
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| EngineError::LlmUnavailable(e.to_string()))?;

        let (status, bytes) = net::read_body_capped(resp, "llm").await.map_err(|e| {
            EngineError::LlmUnavailable(e.to_string())
        })?;
        if !status.is_success() {
            return Err(EngineError::LlmUnavailable(format!(
                "HTTP {status}: {}",
                net::body_excerpt(&bytes)
            )));
        }

        let parsed: ChatCompletionResponse = serde_json::from_slice(&bytes).map_err(|e| {
            warn!(error = %e, "llm response failed to parse as chat completion");
            EngineError::LlmUnavailable(format!("unparsable llm response: {e}"))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| EngineError::LlmUnavailable("llm returned no choices".to_string()))
    }
}

/// Returns a fixed sequence of responses, consumed one per call — the
/// first call gets the draft, a second (repair) call gets the
/// corrected JSON. Used by compiler tests and the end-to-end
/// integration tests (SPEC_FULL.md §8) in place of network access.
pub struct FakeLlmClient {
    responses: std::sync::Mutex<std::collections::VecDeque<String>>,
}

impl FakeLlmClient {
    pub fn new(responses: impl IntoIterator<Item = String>) -> Self {
        Self {
            responses: std::sync::Mutex::new(responses.into_iter().collect()),
        }
    }
}

#[async_trait]
impl LlmClient for FakeLlmClient {
    async fn complete(&self, _prompt: &str) -> Result<String, EngineError> {
        self.responses
            .lock()
            .expect("fake llm client mutex poisoned")
            .pop_front()
            .ok_or_else(|| EngineError::LlmUnavailable("fake llm client exhausted".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fake_client_returns_responses_in_order() {
        let client = FakeLlmClient::new(["first".to_string(), "second".to_string()]);
        assert_eq!(client.complete("prompt").await.unwrap(), "first");
        assert_eq!(client.complete("prompt").await.unwrap(), "second");
    }

    #[tokio::test]
    async fn fake_client_errors_when_exhausted() {
        let client = FakeLlmClient::new(Vec::<String>::new());
        let err = client.complete("prompt").await.unwrap_err();
        assert!(matches!(err, EngineError::LlmUnavailable(_)));
    }
}
