//! Ports: contracts between the engine and its external collaborators.

mod ai_provider;
mod context_validator;
mod performance_analyzer;
mod scenario_generator;
mod simulation_store;
mod turn_generator;

pub use ai_provider::{
    AiError, AiProvider, ChatMessage, ChatRole, CompletionFinishReason, CompletionRequest,
    CompletionResponse, ProviderInfo, RequestMetadata, TokenUsage,
};
pub use context_validator::{ContextValidator, ContextVerdict, ValidationRequest};
pub use performance_analyzer::{AnalysisError, PerformanceAnalyzer};
pub use scenario_generator::{ScenarioError, ScenarioGenerator, ScenarioRequest};
pub use simulation_store::{SimulationStore, StoreError};
pub use turn_generator::{ClientTurnGenerator, GeneratedTurn, TurnError, TurnKind, TurnRequest};
