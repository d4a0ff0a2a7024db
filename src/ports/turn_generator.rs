//! Client Turn Generator Port - produces the simulated client's utterances.

use async_trait::async_trait;

use crate::domain::catalog::Stage;
use crate::domain::simulation::{ClientProfile, ConversationHistory, SimulationMode};

/// What kind of turn is being requested.
///
/// An opening line has no advisor message to react to; a reply always does.
/// Encoding the distinction in the type removes the blank-message
/// precondition from the runtime contract.
#[derive(Debug, Clone)]
pub enum TurnKind {
    /// The stage's opening line, spoken before the advisor's first turn.
    Opening,
    /// A reply to the advisor's latest message.
    Reply { advisor_message: String },
}

/// Typed request for one client turn.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub product_name: String,
    pub profile: ClientProfile,
    pub stage: Stage,
    pub history: ConversationHistory,
    pub mode: SimulationMode,
    pub kind: TurnKind,
}

/// A generated client turn.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedTurn {
    /// The client's utterance.
    pub text: String,
    /// The generator decided the conversation has to end here. Treated by
    /// the engine exactly like a context-validator rejection.
    pub must_end_simulation: bool,
    /// Optional coaching note, only requested in learning mode.
    pub guidance: Option<String>,
}

impl GeneratedTurn {
    /// Plain reply with no termination flag and no guidance.
    pub fn reply(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            must_end_simulation: false,
            guidance: None,
        }
    }
}

/// Errors from the turn generation backend.
#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error("turn backend failure: {message}")]
    Backend { message: String },

    #[error("turn response could not be interpreted: {message}")]
    InvalidResponse { message: String },
}

impl TurnError {
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

/// Port for generating client turns.
#[async_trait]
pub trait ClientTurnGenerator: Send + Sync {
    async fn generate(&self, request: TurnRequest) -> Result<GeneratedTurn, TurnError>;
}
