//! Anthropic Provider - Implementation of AiProvider for the Claude API.
//!
//! Non-streaming Messages API client. Retries transient failures with
//! exponential backoff up to the configured attempt count.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    AiError, AiProvider, ChatRole, CompletionFinishReason, CompletionRequest, CompletionResponse,
    ProviderInfo, TokenUsage,
};

/// Anthropic API version header value.
const ANTHROPIC_API_VERSION: &str = "2023-06-01";

/// Configuration for the Anthropic provider.
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    api_key: Secret<String>,
    /// Model to use.
    pub model: String,
    /// Base URL for the API.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum retries on transient failures.
    pub max_retries: u32,
}

impl AnthropicConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "claude-sonnet-4-20250514".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            timeout: Duration::from_secs(60),
            max_retries: 3,
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the maximum retry count.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// Anthropic API provider implementation.
pub struct AnthropicProvider {
    config: AnthropicConfig,
    client: Client,
}

impl AnthropicProvider {
    /// Creates a new Anthropic provider with the given configuration.
    pub fn new(config: AnthropicConfig) -> Result<Self, AiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AiError::InvalidRequest(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.config.base_url)
    }

    fn to_wire_request(&self, request: &CompletionRequest) -> WireRequest {
        let messages = request
            .messages
            .iter()
            .map(|msg| WireMessage {
                role: match msg.role {
                    ChatRole::User => "user",
                    ChatRole::Assistant => "assistant",
                },
                content: msg.content.clone(),
            })
            .collect();

        WireRequest {
            model: self.config.model.clone(),
            messages,
            system: request.system_prompt.clone(),
            max_tokens: request.max_tokens.unwrap_or(1024),
            temperature: request.temperature,
        }
    }

    async fn send_once(&self, wire: &WireRequest) -> Result<CompletionResponse, AiError> {
        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", self.config.api_key())
            .header("anthropic-version", ANTHROPIC_API_VERSION)
            .json(wire)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AiError::Timeout {
                        timeout_secs: self.config.timeout.as_secs() as u32,
                    }
                } else {
                    AiError::network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::map_error_status(status, response).await);
        }

        let body: WireResponse = response
            .json()
            .await
            .map_err(|e| AiError::parse(e.to_string()))?;

        let content = body
            .content
            .iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text.as_str())
            .collect::<Vec<_>>()
            .join("");

        if content.is_empty() {
            return Err(AiError::parse("response carried no text content"));
        }

        Ok(CompletionResponse {
            content,
            model: body.model,
            usage: TokenUsage::new(body.usage.input_tokens, body.usage.output_tokens),
            finish_reason: match body.stop_reason.as_deref() {
                Some("max_tokens") => CompletionFinishReason::Length,
                Some("end_turn") | Some("stop_sequence") => CompletionFinishReason::Stop,
                _ => CompletionFinishReason::Stop,
            },
        })
    }

    async fn map_error_status(status: StatusCode, response: reqwest::Response) -> AiError {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u32>().ok());
        let body = response.text().await.unwrap_or_default();

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AiError::AuthenticationFailed,
            StatusCode::TOO_MANY_REQUESTS => AiError::rate_limited(retry_after.unwrap_or(30)),
            StatusCode::BAD_REQUEST => AiError::InvalidRequest(body),
            s if s.is_server_error() => {
                AiError::unavailable(format!("status {}: {}", s.as_u16(), body))
            }
            s => AiError::network(format!("unexpected status {}: {}", s.as_u16(), body)),
        }
    }
}

#[async_trait]
impl AiProvider for AnthropicProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AiError> {
        if request.messages.is_empty() {
            return Err(AiError::InvalidRequest(
                "completion request needs at least one message".to_string(),
            ));
        }

        let wire = self.to_wire_request(&request);

        let mut attempt = 0;
        loop {
            match self.send_once(&wire).await {
                Ok(response) => return Ok(response),
                Err(err) if err.is_retryable() && attempt < self.config.max_retries => {
                    let backoff = Duration::from_millis(250 * 2u64.pow(attempt));
                    tracing::warn!(
                        operation = request.metadata.operation,
                        attempt,
                        error = %err,
                        "generation backend call failed, retrying"
                    );
                    sleep(backoff).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("anthropic", self.config.model.clone())
    }
}

// === Wire types ===

#[derive(Debug, Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    content: Vec<WireContentBlock>,
    model: String,
    stop_reason: Option<String>,
    usage: WireUsage,
}

#[derive(Debug, Deserialize)]
struct WireContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::TraineeId;
    use crate::ports::RequestMetadata;

    fn provider() -> AnthropicProvider {
        AnthropicProvider::new(AnthropicConfig::new("sk-ant-test").with_model("claude-test"))
            .unwrap()
    }

    fn request_with_messages() -> CompletionRequest {
        let metadata = RequestMetadata::new(TraineeId::new("t1").unwrap(), None, "test");
        CompletionRequest::new(metadata)
            .with_system_prompt("Actúa como cliente bancario")
            .with_message(ChatRole::User, "Buenos días")
            .with_message(ChatRole::Assistant, "Buenos días, ¿en qué le ayudo?")
            .with_max_tokens(256)
    }

    #[test]
    fn wire_request_maps_roles_and_prompt() {
        let provider = provider();
        let wire = provider.to_wire_request(&request_with_messages());

        assert_eq!(wire.model, "claude-test");
        assert_eq!(wire.system.as_deref(), Some("Actúa como cliente bancario"));
        assert_eq!(wire.max_tokens, 256);
        assert_eq!(wire.messages.len(), 2);
        assert_eq!(wire.messages[0].role, "user");
        assert_eq!(wire.messages[1].role, "assistant");
    }

    #[test]
    fn wire_request_serializes_without_empty_optionals() {
        let provider = provider();
        let metadata = RequestMetadata::new(TraineeId::new("t1").unwrap(), None, "test");
        let request = CompletionRequest::new(metadata).with_message(ChatRole::User, "Hola");

        let wire = provider.to_wire_request(&request);
        let json = serde_json::to_string(&wire).unwrap();

        assert!(!json.contains("\"system\""));
        assert!(!json.contains("\"temperature\""));
        assert!(json.contains("\"max_tokens\":1024"));
    }

    #[tokio::test]
    async fn empty_request_is_rejected_before_any_network_call() {
        let provider = provider();
        let metadata = RequestMetadata::new(TraineeId::new("t1").unwrap(), None, "test");
        let result = provider.complete(CompletionRequest::new(metadata)).await;

        assert!(matches!(result, Err(AiError::InvalidRequest(_))));
    }

    #[test]
    fn wire_response_parses_text_blocks() {
        let json = r#"{
            "content": [{"type": "text", "text": "Hola, vengo por la tarjeta"}],
            "model": "claude-test",
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 42, "output_tokens": 12}
        }"#;

        let body: WireResponse = serde_json::from_str(json).unwrap();
        assert_eq!(body.content.len(), 1);
        assert_eq!(body.content[0].text, "Hola, vengo por la tarjeta");
        assert_eq!(body.usage.input_tokens, 42);
    }
}
