//! Performance Analyzer Port - optional post-completion collaborator.

use async_trait::async_trait;

use crate::domain::simulation::Simulation;

/// Errors from the analysis backend.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("analysis backend failure: {message}")]
    Backend { message: String },
}

impl AnalysisError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}

/// Port for the post-completion performance analysis.
///
/// Invoked best-effort when a simulation finishes with reason `completed`;
/// failures are logged and never affect the completed simulation.
#[async_trait]
pub trait PerformanceAnalyzer: Send + Sync {
    async fn analyze(&self, simulation: &Simulation) -> Result<(), AnalysisError>;
}
