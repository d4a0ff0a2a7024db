//! Simulation aggregate: one training session per trainee.
//!
//! Tracks the stage cursor, lifecycle, conversation history, generated
//! client profile and duration bookkeeping for a single session.

use serde::{Deserialize, Serialize};

use crate::domain::catalog::{Product, Stage};
use crate::domain::foundation::{DomainError, ErrorCode, SimulationId, Timestamp, TraineeId};

use super::history::{ConversationHistory, Role, Turn};
use super::profile::ClientProfile;

/// Training mode selected at start time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationMode {
    Learning,
    Evaluative,
}

impl SimulationMode {
    /// Wire representation used by the API and persistence.
    pub fn as_str(&self) -> &'static str {
        match self {
            SimulationMode::Learning => "learning",
            SimulationMode::Evaluative => "evaluative",
        }
    }

    /// Parses the wire representation.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "learning" => Some(SimulationMode::Learning),
            "evaluative" => Some(SimulationMode::Evaluative),
            _ => None,
        }
    }
}

/// Lifecycle state of a simulation. `Finished` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    InProgress,
    Paused,
    Finished,
}

impl Lifecycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lifecycle::InProgress => "in_progress",
            Lifecycle::Paused => "paused",
            Lifecycle::Finished => "finished",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "in_progress" => Some(Lifecycle::InProgress),
            "paused" => Some(Lifecycle::Paused),
            "finished" => Some(Lifecycle::Finished),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Lifecycle::Finished)
    }
}

/// Why a simulation reached the `Finished` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    ContextViolation,
    Completed,
    Manual,
}

impl FinishReason {
    /// Machine-readable wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            FinishReason::ContextViolation => "context_violation",
            FinishReason::Completed => "completed",
            FinishReason::Manual => "manual",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "context_violation" => Some(FinishReason::ContextViolation),
            "completed" => Some(FinishReason::Completed),
            "manual" => Some(FinishReason::Manual),
            _ => None,
        }
    }
}

/// Coaching note accumulated in learning mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningNote {
    pub stage_number: u32,
    pub text: String,
    pub created_at: Timestamp,
}

/// One trainee's simulation session.
///
/// Invariant: `1 <= current_stage <= total_stages`. The stage cursor only
/// moves through [`Simulation::advance_stage`], which refuses to move past
/// the last stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Simulation {
    pub id: SimulationId,
    pub trainee_id: TraineeId,
    pub product_slug: String,
    pub mode: SimulationMode,
    pub current_stage: u32,
    pub total_stages: u32,
    pub lifecycle: Lifecycle,
    pub finish_reason: Option<FinishReason>,
    pub started_at: Timestamp,
    /// Start of the current in-progress segment; reset on resume.
    pub segment_started_at: Timestamp,
    pub last_interaction_at: Timestamp,
    pub finished_at: Option<Timestamp>,
    /// Active seconds accumulated in closed segments (paused time excluded).
    pub accumulated_secs: i64,
    /// Optimistic concurrency token, bumped by the store on every update.
    pub version: i64,
    pub profile: ClientProfile,
    pub history: ConversationHistory,
    pub notes: Vec<LearningNote>,
}

impl Simulation {
    /// Creates a new simulation at stage 1 for the given product.
    pub fn new(
        trainee_id: TraineeId,
        product: &Product,
        mode: SimulationMode,
        profile: ClientProfile,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id: SimulationId::new(),
            trainee_id,
            product_slug: product.slug.clone(),
            mode,
            current_stage: 1,
            total_stages: product.total_stages(),
            lifecycle: Lifecycle::InProgress,
            finish_reason: None,
            started_at: now,
            segment_started_at: now,
            last_interaction_at: now,
            finished_at: None,
            accumulated_secs: 0,
            version: 1,
            profile,
            history: ConversationHistory::new(),
            notes: Vec::new(),
        }
    }

    // === Accessors ===

    pub fn is_in_progress(&self) -> bool {
        self.lifecycle == Lifecycle::InProgress
    }

    pub fn is_active(&self) -> bool {
        !self.lifecycle.is_terminal()
    }

    pub fn is_on_last_stage(&self) -> bool {
        self.current_stage == self.total_stages
    }

    /// Active duration in seconds: closed segments plus the live one.
    pub fn duration_secs(&self) -> i64 {
        let live = match self.lifecycle {
            Lifecycle::InProgress => Timestamp::now().seconds_since(&self.segment_started_at),
            _ => 0,
        };
        self.accumulated_secs + live
    }

    // === Turn recording ===

    /// Appends a turn for the given stage and refreshes the interaction clock.
    pub fn record_turn(&mut self, stage: &Stage, sender: Role, text: impl Into<String>) -> Turn {
        let total = self.total_stages;
        let turn = self.history.record(stage, total, sender, text).clone();
        self.last_interaction_at = Timestamp::now();
        turn
    }

    /// Stores a coaching note for the current stage.
    pub fn add_note(&mut self, text: impl Into<String>) {
        self.notes.push(LearningNote {
            stage_number: self.current_stage,
            text: text.into(),
            created_at: Timestamp::now(),
        });
    }

    // === State transitions ===

    /// Moves the stage cursor forward by one.
    ///
    /// Fails on a finished/paused simulation and on the last stage.
    pub fn advance_stage(&mut self) -> Result<(), DomainError> {
        if !self.is_in_progress() {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Cannot advance a {} simulation", self.lifecycle.as_str()),
            ));
        }
        if self.is_on_last_stage() {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                "Cannot advance past the last stage",
            ));
        }
        self.current_stage += 1;
        self.last_interaction_at = Timestamp::now();
        Ok(())
    }

    /// Finishes the simulation with the given reason. Terminal.
    pub fn finish(&mut self, reason: FinishReason) -> Result<(), DomainError> {
        if self.lifecycle.is_terminal() {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                "Simulation is already finished",
            ));
        }
        let now = Timestamp::now();
        if self.lifecycle == Lifecycle::InProgress {
            self.accumulated_secs += now.seconds_since(&self.segment_started_at);
        }
        self.lifecycle = Lifecycle::Finished;
        self.finish_reason = Some(reason);
        self.finished_at = Some(now);
        self.last_interaction_at = now;
        Ok(())
    }

    /// Suspends an in-progress simulation, closing the active segment.
    pub fn pause(&mut self) -> Result<(), DomainError> {
        if self.lifecycle != Lifecycle::InProgress {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Cannot pause a {} simulation", self.lifecycle.as_str()),
            ));
        }
        let now = Timestamp::now();
        self.accumulated_secs += now.seconds_since(&self.segment_started_at);
        self.lifecycle = Lifecycle::Paused;
        self.last_interaction_at = now;
        Ok(())
    }

    /// Resumes a paused simulation, opening a fresh segment.
    pub fn resume(&mut self) -> Result<(), DomainError> {
        if self.lifecycle != Lifecycle::Paused {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Cannot resume a {} simulation", self.lifecycle.as_str()),
            ));
        }
        let now = Timestamp::now();
        self.segment_started_at = now;
        self.lifecycle = Lifecycle::InProgress;
        self.last_interaction_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog;
    use crate::domain::simulation::profile::{Gender, KnowledgeLevel, RiskProfile};

    fn sample_profile() -> ClientProfile {
        ClientProfile {
            name: "Jorge Calderón".to_string(),
            age: 45,
            occupation: "Contador".to_string(),
            current_situation: "Asalariado con ingresos estables".to_string(),
            motivation: "Organizar sus ahorros".to_string(),
            knowledge_level: KnowledgeLevel::Intermediate,
            risk_profile: RiskProfile::Moderate,
            financial_goal: "Fondo de emergencia".to_string(),
            background: "Cliente de otro banco desde hace una década".to_string(),
            gender: Gender::Male,
        }
    }

    fn sample_simulation() -> Simulation {
        let product = catalog::resolve("cuenta-ahorros").unwrap();
        Simulation::new(
            TraineeId::new("trainee-1").unwrap(),
            product,
            SimulationMode::Learning,
            sample_profile(),
        )
    }

    #[test]
    fn new_simulation_starts_at_stage_one_in_progress() {
        let sim = sample_simulation();
        assert_eq!(sim.current_stage, 1);
        assert_eq!(sim.total_stages, 7);
        assert_eq!(sim.lifecycle, Lifecycle::InProgress);
        assert!(sim.finish_reason.is_none());
        assert!(sim.history.is_empty());
        assert_eq!(sim.version, 1);
    }

    #[test]
    fn advance_stage_increments_cursor() {
        let mut sim = sample_simulation();
        sim.advance_stage().unwrap();
        assert_eq!(sim.current_stage, 2);
    }

    #[test]
    fn advance_stage_refuses_past_last_stage() {
        let mut sim = sample_simulation();
        for _ in 1..sim.total_stages {
            sim.advance_stage().unwrap();
        }
        assert!(sim.is_on_last_stage());
        assert!(sim.advance_stage().is_err());
        assert_eq!(sim.current_stage, sim.total_stages);
    }

    #[test]
    fn finish_is_terminal() {
        let mut sim = sample_simulation();
        sim.finish(FinishReason::Completed).unwrap();

        assert_eq!(sim.lifecycle, Lifecycle::Finished);
        assert_eq!(sim.finish_reason, Some(FinishReason::Completed));
        assert!(sim.finished_at.is_some());

        assert!(sim.finish(FinishReason::Manual).is_err());
        assert!(sim.advance_stage().is_err());
        assert!(sim.pause().is_err());
    }

    #[test]
    fn pause_and_resume_toggle_lifecycle() {
        let mut sim = sample_simulation();
        sim.pause().unwrap();
        assert_eq!(sim.lifecycle, Lifecycle::Paused);
        assert!(sim.pause().is_err());

        sim.resume().unwrap();
        assert_eq!(sim.lifecycle, Lifecycle::InProgress);
        assert!(sim.resume().is_err());
    }

    #[test]
    fn paused_simulation_is_active_but_not_in_progress() {
        let mut sim = sample_simulation();
        sim.pause().unwrap();
        assert!(sim.is_active());
        assert!(!sim.is_in_progress());
    }

    #[test]
    fn record_turn_tags_current_stage() {
        let mut sim = sample_simulation();
        let product = catalog::resolve("cuenta-ahorros").unwrap();
        let stage = product.stage(sim.current_stage).unwrap();

        sim.record_turn(stage, Role::Advisor, "Buenos días, bienvenido");

        assert_eq!(sim.history.len(), 1);
        assert_eq!(sim.history.exchanges_in_stage(1), 1);
        assert_eq!(sim.history.last().unwrap().total_stages, 7);
    }

    #[test]
    fn add_note_tags_current_stage() {
        let mut sim = sample_simulation();
        sim.advance_stage().unwrap();
        sim.add_note("Pregunta abierta bien usada");

        assert_eq!(sim.notes.len(), 1);
        assert_eq!(sim.notes[0].stage_number, 2);
    }

    #[test]
    fn finish_reason_wire_strings_are_stable() {
        assert_eq!(FinishReason::ContextViolation.as_str(), "context_violation");
        assert_eq!(FinishReason::Completed.as_str(), "completed");
        assert_eq!(FinishReason::Manual.as_str(), "manual");
        assert_eq!(
            FinishReason::parse("context_violation"),
            Some(FinishReason::ContextViolation)
        );
    }

    #[test]
    fn lifecycle_wire_strings_are_stable() {
        assert_eq!(Lifecycle::InProgress.as_str(), "in_progress");
        assert_eq!(Lifecycle::parse("paused"), Some(Lifecycle::Paused));
        assert_eq!(Lifecycle::parse("archived"), None);
    }

    #[test]
    fn duration_never_negative_after_finish() {
        let mut sim = sample_simulation();
        sim.finish(FinishReason::Manual).unwrap();
        assert!(sim.duration_secs() >= 0);
    }

    #[test]
    fn simulation_roundtrips_through_json() {
        let sim = sample_simulation();
        let json = serde_json::to_string(&sim).unwrap();
        let back: Simulation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sim);
    }
}
