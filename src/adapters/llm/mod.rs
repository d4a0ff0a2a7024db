//! LLM-backed implementations of the generation ports.
//!
//! One adapter per port, all speaking to the backend through `AiProvider`.
//! Responses follow a small JSON contract per adapter; `extract_json` peels
//! off any prose the model wraps around the object.

mod analyzer;
mod scenario;
pub mod scripted;
mod turns;
mod validator;

pub use analyzer::LlmPerformanceAnalyzer;
pub use scenario::LlmScenarioGenerator;
pub use turns::LlmClientTurnGenerator;
pub use validator::LlmContextValidator;

/// Extracts the first JSON object embedded in model output.
pub(crate) fn extract_json(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&content[start..=end])
}
