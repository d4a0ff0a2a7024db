//! AI Provider Port - Interface for the text-generation backend.
//!
//! Abstracts the LLM service behind the scenario generator, context validator
//! and client turn generator so those adapters never couple to a concrete
//! provider API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{SimulationId, TraineeId};

/// Port for LLM completions.
///
/// Implementations connect to an external generation service and translate
/// between the provider-specific API and our types.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Generate a single completion.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AiError>;

    /// Get provider information (name, model).
    fn provider_info(&self) -> ProviderInfo;
}

/// Request for a completion.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Conversation messages (history + current user message).
    pub messages: Vec<ChatMessage>,
    /// System prompt to guide model behavior.
    pub system_prompt: Option<String>,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
    /// Temperature for response randomness.
    pub temperature: Option<f32>,
    /// Request metadata for tracing.
    pub metadata: RequestMetadata,
}

impl CompletionRequest {
    /// Creates a new completion request with required metadata.
    pub fn new(metadata: RequestMetadata) -> Self {
        Self {
            messages: Vec::new(),
            system_prompt: None,
            max_tokens: None,
            temperature: None,
            metadata,
        }
    }

    /// Adds a message to the conversation.
    pub fn with_message(mut self, role: ChatRole, content: impl Into<String>) -> Self {
        self.messages.push(ChatMessage::new(role, content));
        self
    }

    /// Sets the system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Sets the maximum tokens to generate.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Sets the temperature.
    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }
}

/// A message in the completion conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    /// Creates a new message.
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    /// Creates an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }
}

/// Role of the message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// Request metadata for tracing.
#[derive(Debug, Clone)]
pub struct RequestMetadata {
    /// Trainee whose simulation triggered the request.
    pub trainee_id: TraineeId,
    /// Simulation the request belongs to, when one exists yet.
    pub simulation_id: Option<SimulationId>,
    /// Engine operation that issued the request (e.g. "client_turn").
    pub operation: &'static str,
}

impl RequestMetadata {
    /// Creates new request metadata.
    pub fn new(
        trainee_id: TraineeId,
        simulation_id: Option<SimulationId>,
        operation: &'static str,
    ) -> Self {
        Self {
            trainee_id,
            simulation_id,
            operation,
        }
    }
}

/// Response from a completion.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Generated content.
    pub content: String,
    /// Model that generated the response.
    pub model: String,
    /// Token usage.
    pub usage: TokenUsage,
    /// Why the model stopped generating.
    pub finish_reason: CompletionFinishReason,
}

/// Token usage information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    /// Creates new token usage.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }

    /// Creates zero usage.
    pub fn zero() -> Self {
        Self::default()
    }
}

/// Reason the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionFinishReason {
    Stop,
    Length,
    ContentFilter,
    Error,
}

/// Provider information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// Provider name (e.g., "anthropic").
    pub name: String,
    /// Model identifier.
    pub model: String,
}

impl ProviderInfo {
    /// Creates new provider info.
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
        }
    }
}

/// AI provider errors.
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    /// Rate limited by provider.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u32 },

    /// Provider is unavailable.
    #[error("provider unavailable: {message}")]
    Unavailable { message: String },

    /// API key or authentication failed.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Network error during request.
    #[error("network error: {0}")]
    Network(String),

    /// Failed to parse provider response.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid request configuration.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Request timed out.
    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u32 },
}

impl AiError {
    /// Creates a rate limited error.
    pub fn rate_limited(retry_after_secs: u32) -> Self {
        Self::RateLimited { retry_after_secs }
    }

    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Returns true if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AiError::RateLimited { .. }
                | AiError::Unavailable { .. }
                | AiError::Network(_)
                | AiError::Timeout { .. }
        )
    }
}
