//! Simulation aggregate, conversation history and progression policy.

mod history;
mod profile;
pub mod progression;
mod simulation;

pub use history::{ConversationHistory, Role, Turn};
pub use profile::{ClientProfile, Gender, KnowledgeLevel, RiskProfile};
pub use progression::StageProgress;
pub use simulation::{FinishReason, LearningNote, Lifecycle, Simulation, SimulationMode};
