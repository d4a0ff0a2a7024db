//! Generation backend configuration.

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Configuration for the text-generation backend.
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Anthropic API key.
    pub anthropic_api_key: Option<String>,

    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries on transient failure.
    #[serde(default = "default_retries")]
    pub max_retries: u32,
}

impl AiConfig {
    /// Get timeout as Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validates AI configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match &self.anthropic_api_key {
            Some(key) if !key.is_empty() => Ok(()),
            _ => Err(ValidationError::MissingRequired("AI__ANTHROPIC_API_KEY")),
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            anthropic_api_key: None,
            model: default_model(),
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
        }
    }
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_retries() -> u32 {
    3
}
