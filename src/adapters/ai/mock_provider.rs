//! Mock AI Provider for testing.
//!
//! Configurable mock implementation of the AiProvider port, allowing tests
//! to run without calling a real generation service.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::ports::{
    AiError, AiProvider, CompletionFinishReason, CompletionRequest, CompletionResponse,
    ProviderInfo, TokenUsage,
};

/// A configured mock response.
#[derive(Debug)]
enum MockResponse {
    Success(String),
    Error(AiError),
}

/// Mock provider that returns scripted responses in order and records calls.
#[derive(Debug, Clone, Default)]
pub struct MockAiProvider {
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    calls: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockAiProvider {
    /// Creates a new mock provider with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a successful response to the queue.
    pub fn with_response(self, content: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(MockResponse::Success(content.into()));
        self
    }

    /// Adds an error response to the queue.
    pub fn with_error(self, error: AiError) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(MockResponse::Error(error));
        self
    }

    /// Returns the number of calls made to this provider.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Returns all recorded calls.
    pub fn get_calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AiProvider for MockAiProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AiError> {
        self.calls.lock().unwrap().push(request);

        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(MockResponse::Error(err)) => Err(err),
            Some(MockResponse::Success(content)) => Ok(success(content)),
            // Default once the queue runs dry, like an always-agreeable model
            None => Ok(success("Respuesta simulada".to_string())),
        }
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("mock", "mock-model")
    }
}

fn success(content: String) -> CompletionResponse {
    CompletionResponse {
        content,
        model: "mock-model".to_string(),
        usage: TokenUsage::new(10, 20),
        finish_reason: CompletionFinishReason::Stop,
    }
}
