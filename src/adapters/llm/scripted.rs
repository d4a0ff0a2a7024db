//! Deterministic scripted fakes for the generation ports.
//!
//! Used by handler unit tests and the integration suite so engine behavior
//! can be asserted without a generation backend.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::domain::simulation::{
    ClientProfile, Gender, KnowledgeLevel, RiskProfile, Simulation,
};
use crate::ports::{
    AnalysisError, ClientTurnGenerator, ContextValidator, ContextVerdict, GeneratedTurn,
    PerformanceAnalyzer, ScenarioError, ScenarioGenerator, ScenarioRequest, TurnError,
    TurnRequest, ValidationRequest,
};

/// A fixed, plausible persona for tests.
pub fn sample_profile() -> ClientProfile {
    ClientProfile {
        name: "Marcela Ríos".to_string(),
        age: 31,
        occupation: "Diseñadora independiente".to_string(),
        current_situation: "Ingresos variables, sin productos bancarios".to_string(),
        motivation: "Separar sus ahorros del dinero del día a día".to_string(),
        knowledge_level: KnowledgeLevel::Basic,
        risk_profile: RiskProfile::Conservative,
        financial_goal: "Reunir la cuota inicial de un apartamento".to_string(),
        background: "Ha tenido malas experiencias con cobros inesperados".to_string(),
        gender: Gender::Female,
    }
}

// === Scenario generator ===

/// Returns a fixed profile, or a scripted failure.
pub struct ScriptedScenarioGenerator {
    profile: ClientProfile,
    fail: bool,
    calls: Arc<Mutex<Vec<ScenarioRequest>>>,
}

impl ScriptedScenarioGenerator {
    /// Always returns the given profile.
    pub fn returning(profile: ClientProfile) -> Self {
        Self {
            profile,
            fail: false,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Always returns [`sample_profile`].
    pub fn with_sample_profile() -> Self {
        Self::returning(sample_profile())
    }

    /// Always fails with a backend error.
    pub fn failing() -> Self {
        Self {
            profile: sample_profile(),
            fail: true,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn get_calls(&self) -> Vec<ScenarioRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScenarioGenerator for ScriptedScenarioGenerator {
    async fn generate(&self, request: ScenarioRequest) -> Result<ClientProfile, ScenarioError> {
        self.calls.lock().unwrap().push(request);
        if self.fail {
            return Err(ScenarioError::backend("scripted scenario failure"));
        }
        Ok(self.profile.clone())
    }
}

// === Context validator ===

/// Returns scripted verdicts in order; accepts once the queue is empty.
pub struct ScriptedContextValidator {
    verdicts: Arc<Mutex<VecDeque<ContextVerdict>>>,
    calls: Arc<Mutex<Vec<ValidationRequest>>>,
}

impl ScriptedContextValidator {
    /// Accepts every message.
    pub fn accepting() -> Self {
        Self {
            verdicts: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queues a verdict to return on the next call.
    pub fn with_verdict(self, verdict: ContextVerdict) -> Self {
        self.verdicts.lock().unwrap().push_back(verdict);
        self
    }

    /// Queues a rejection with the given reason.
    pub fn with_rejection(self, reason: impl Into<String>) -> Self {
        self.with_verdict(ContextVerdict::rejected(reason))
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ContextValidator for ScriptedContextValidator {
    async fn validate(&self, request: ValidationRequest) -> ContextVerdict {
        self.calls.lock().unwrap().push(request);
        self.verdicts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| ContextVerdict::accepted("scripted acceptance"))
    }
}

// === Client turn generator ===

enum ScriptedOutcome {
    Turn(GeneratedTurn),
    Failure(String),
}

/// Returns scripted turns in order; a plain reply once the queue is empty.
pub struct ScriptedTurnGenerator {
    outcomes: Arc<Mutex<VecDeque<ScriptedOutcome>>>,
    requests: Arc<Mutex<Vec<TurnRequest>>>,
}

impl ScriptedTurnGenerator {
    pub fn new() -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queues a plain reply.
    pub fn with_reply(self, text: impl Into<String>) -> Self {
        self.with_turn(GeneratedTurn::reply(text))
    }

    /// Queues a full turn (termination flag, guidance).
    pub fn with_turn(self, turn: GeneratedTurn) -> Self {
        self.outcomes
            .lock()
            .unwrap()
            .push_back(ScriptedOutcome::Turn(turn));
        self
    }

    /// Queues a backend failure.
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.outcomes
            .lock()
            .unwrap()
            .push_back(ScriptedOutcome::Failure(message.into()));
        self
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Requests received so far, for asserting on stage/kind.
    pub fn get_requests(&self) -> Vec<TurnRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for ScriptedTurnGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClientTurnGenerator for ScriptedTurnGenerator {
    async fn generate(&self, request: TurnRequest) -> Result<GeneratedTurn, TurnError> {
        self.requests.lock().unwrap().push(request);
        match self.outcomes.lock().unwrap().pop_front() {
            Some(ScriptedOutcome::Turn(turn)) => Ok(turn),
            Some(ScriptedOutcome::Failure(message)) => Err(TurnError::backend(message)),
            None => Ok(GeneratedTurn::reply("Entiendo, cuénteme un poco más.")),
        }
    }
}

// === Performance analyzer ===

/// Records invocations; optionally fails.
pub struct RecordingAnalyzer {
    fail: bool,
    calls: Arc<Mutex<usize>>,
}

impl RecordingAnalyzer {
    pub fn new() -> Self {
        Self {
            fail: false,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl Default for RecordingAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PerformanceAnalyzer for RecordingAnalyzer {
    async fn analyze(&self, _simulation: &Simulation) -> Result<(), AnalysisError> {
        *self.calls.lock().unwrap() += 1;
        if self.fail {
            return Err(AnalysisError::backend("scripted analysis failure"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{InitiatingRole, Stage};
    use crate::domain::simulation::{ConversationHistory, SimulationMode};
    use crate::ports::TurnKind;

    fn turn_request() -> TurnRequest {
        TurnRequest {
            product_name: "Cuenta de Ahorros".to_string(),
            profile: sample_profile(),
            stage: Stage::new(1, "Saludo", "Abrir", InitiatingRole::Advisor),
            history: ConversationHistory::new(),
            mode: SimulationMode::Learning,
            kind: TurnKind::Opening,
        }
    }

    #[tokio::test]
    async fn scripted_turns_come_back_in_order_then_default() {
        let generator = ScriptedTurnGenerator::new()
            .with_reply("primera")
            .with_failure("se cayó");

        let first = generator.generate(turn_request()).await.unwrap();
        assert_eq!(first.text, "primera");

        let second = generator.generate(turn_request()).await;
        assert!(matches!(second, Err(TurnError::Backend { .. })));

        let third = generator.generate(turn_request()).await.unwrap();
        assert!(!third.text.is_empty());
        assert_eq!(generator.call_count(), 3);
    }

    #[tokio::test]
    async fn scripted_validator_defaults_to_acceptance() {
        let validator = ScriptedContextValidator::accepting().with_rejection("fuera de tema");

        let request = ValidationRequest {
            advisor_message: "hola".to_string(),
            product_name: "Cuenta de Ahorros".to_string(),
            stage: Stage::new(1, "Saludo", "Abrir", InitiatingRole::Advisor),
            profile: sample_profile(),
            history: ConversationHistory::new(),
        };

        let first = validator.validate(request.clone()).await;
        assert!(!first.in_context);

        let second = validator.validate(request).await;
        assert!(second.in_context);
    }
}
