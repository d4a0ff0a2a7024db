//! Scenario Generator Port - produces the client persona for a simulation.

use async_trait::async_trait;

use crate::domain::catalog::{ClientType, Segment};
use crate::domain::simulation::{ClientProfile, SimulationMode};

/// Typed request for one client persona.
#[derive(Debug, Clone)]
pub struct ScenarioRequest {
    pub product_name: String,
    pub client_type: ClientType,
    pub segment: Segment,
    pub mode: SimulationMode,
}

/// Errors from the scenario generation backend.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("scenario backend failure: {message}")]
    Backend { message: String },

    #[error("scenario response could not be interpreted: {message}")]
    InvalidResponse { message: String },
}

impl ScenarioError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }
}

/// Port for generating a client persona at simulation start.
///
/// Fails closed: a backend failure fails the start operation, leaving no
/// half-created simulation behind.
#[async_trait]
pub trait ScenarioGenerator: Send + Sync {
    async fn generate(&self, request: ScenarioRequest) -> Result<ClientProfile, ScenarioError>;
}
