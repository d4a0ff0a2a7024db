//! SubmitMessageHandler - the engine's turn-handling operation.
//!
//! Drives one full exchange: advisor message in, context check, client reply
//! out, stage progression, and any terminal transition that follows.

use std::sync::Arc;

use crate::domain::catalog::{self, Product, Stage};
use crate::domain::foundation::{DomainError, ErrorCode, TraineeId};
use crate::domain::simulation::{
    progression, FinishReason, Role, Simulation, SimulationMode, StageProgress, Turn,
};
use crate::ports::{
    ClientTurnGenerator, ContextValidator, PerformanceAnalyzer, SimulationStore, StoreError,
    TurnError, TurnKind, TurnRequest, ValidationRequest,
};

/// Closing line spoken by the client when a session is cut short.
///
/// Synthetic on purpose: the generation backend is not consulted once the
/// validator has rejected the advisor's message.
const CLOSING_LINE: &str =
    "Disculpe, pero esta conversación no está yendo a ninguna parte. Prefiero terminarla aquí.";

/// Command to submit one advisor message.
#[derive(Debug, Clone)]
pub struct SubmitMessageCommand {
    pub trainee_id: TraineeId,
    pub message: String,
}

/// Result of one submitted message: both turns plus what the engine decided.
#[derive(Debug, Clone)]
pub struct SubmitMessageResult {
    pub simulation: Simulation,
    pub advisor_turn: Turn,
    pub client_turn: Turn,
    pub stage_changed: bool,
    /// Stage descriptor after the operation (new stage when advanced).
    pub current_stage: Stage,
    /// Opener of the new stage, when it is client-initiated and generation
    /// succeeded. Best-effort: `None` does not undo the advancement.
    pub opening_message: Option<Turn>,
    pub finished: bool,
    pub finish_reason: Option<FinishReason>,
    /// Progression evaluation; absent on the context-violation path, where
    /// the policy never runs.
    pub progress: Option<StageProgress>,
}

/// Error type for submitting messages.
#[derive(Debug)]
pub enum SubmitMessageError {
    /// No simulation in progress for this trainee.
    NoActiveSimulation(TraineeId),
    /// Blank message rejected before any mutation.
    EmptyMessage,
    /// Client turn generation failed; the advisor turn stays recorded.
    Generation(String),
    /// Another writer touched the simulation concurrently; retryable.
    Conflict(TraineeId),
    /// Storage error.
    Storage(String),
    /// Domain error.
    Domain(DomainError),
}

impl std::fmt::Display for SubmitMessageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmitMessageError::NoActiveSimulation(id) => {
                write!(f, "No active simulation for trainee {}", id)
            }
            SubmitMessageError::EmptyMessage => write!(f, "Message cannot be empty"),
            SubmitMessageError::Generation(err) => write!(f, "Generation failure: {}", err),
            SubmitMessageError::Conflict(id) => {
                write!(f, "Simulation for trainee {} was modified concurrently", id)
            }
            SubmitMessageError::Storage(err) => write!(f, "Storage error: {}", err),
            SubmitMessageError::Domain(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for SubmitMessageError {}

impl From<DomainError> for SubmitMessageError {
    fn from(err: DomainError) -> Self {
        SubmitMessageError::Domain(err)
    }
}

impl From<StoreError> for SubmitMessageError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => SubmitMessageError::NoActiveSimulation(id),
            StoreError::VersionConflict { trainee_id, .. } => {
                SubmitMessageError::Conflict(trainee_id)
            }
            other => SubmitMessageError::Storage(other.to_string()),
        }
    }
}

/// Handler for the turn-handling operation.
pub struct SubmitMessageHandler {
    store: Arc<dyn SimulationStore>,
    validator: Arc<dyn ContextValidator>,
    turns: Arc<dyn ClientTurnGenerator>,
    analyzer: Arc<dyn PerformanceAnalyzer>,
}

impl SubmitMessageHandler {
    pub fn new(
        store: Arc<dyn SimulationStore>,
        validator: Arc<dyn ContextValidator>,
        turns: Arc<dyn ClientTurnGenerator>,
        analyzer: Arc<dyn PerformanceAnalyzer>,
    ) -> Self {
        Self {
            store,
            validator,
            turns,
            analyzer,
        }
    }

    pub async fn handle(
        &self,
        cmd: SubmitMessageCommand,
    ) -> Result<SubmitMessageResult, SubmitMessageError> {
        // 1. Reject blank input before touching any state
        let message = cmd.message.trim().to_string();
        if message.is_empty() {
            return Err(SubmitMessageError::EmptyMessage);
        }

        // 2. Load the in-progress simulation
        let mut simulation = self
            .store
            .find_active(&cmd.trainee_id)
            .await?
            .filter(Simulation::is_in_progress)
            .ok_or_else(|| SubmitMessageError::NoActiveSimulation(cmd.trainee_id.clone()))?;

        let product = resolve_product(&simulation)?;
        let stage = product
            .stage(simulation.current_stage)
            .ok_or_else(|| stage_out_of_range(&simulation))?
            .clone();

        // 3. Record the advisor's turn
        let advisor_turn = simulation.record_turn(&stage, Role::Advisor, message.clone());

        // 4. Context check over the full context and history so far
        let verdict = self
            .validator
            .validate(ValidationRequest {
                advisor_message: message.clone(),
                product_name: product.name.clone(),
                stage: stage.clone(),
                profile: simulation.profile.clone(),
                history: simulation.history.clone(),
            })
            .await;

        if !verdict.in_context {
            tracing::info!(
                trainee_id = %simulation.trainee_id,
                simulation_id = %simulation.id,
                reason = %verdict.reason,
                "advisor message out of context, terminating simulation"
            );
            return self
                .terminate(simulation, stage, advisor_turn, CLOSING_LINE.to_string())
                .await;
        }

        // 5. Generate the client's reply
        let generated = match self
            .turns
            .generate(TurnRequest {
                product_name: product.name.clone(),
                profile: simulation.profile.clone(),
                stage: stage.clone(),
                history: simulation.history.clone(),
                mode: simulation.mode,
                kind: TurnKind::Reply {
                    advisor_message: message,
                },
            })
            .await
        {
            Ok(generated) => generated,
            Err(err) => return self.fail_generation(simulation, err).await,
        };

        // 6. The generator can also decide the conversation must end
        if generated.must_end_simulation {
            tracing::info!(
                trainee_id = %simulation.trainee_id,
                simulation_id = %simulation.id,
                "client turn generator flagged the conversation for termination"
            );
            return self
                .terminate(simulation, stage, advisor_turn, generated.text)
                .await;
        }

        let client_turn = simulation.record_turn(&stage, Role::Client, generated.text);

        if simulation.mode == SimulationMode::Learning {
            if let Some(guidance) = generated.guidance {
                simulation.add_note(guidance);
            }
        }

        // 7. Progression policy over the stage the exchange belongs to
        let progress = progression::evaluate(&stage, &simulation.history);

        if progress.must_advance && product.is_last_stage(stage.number) {
            // Last stage complete: the whole simulation is done
            simulation.finish(FinishReason::Completed)?;
            self.store.update(&simulation).await?;
            self.trigger_analysis(&simulation);

            tracing::info!(
                trainee_id = %simulation.trainee_id,
                simulation_id = %simulation.id,
                "simulation completed"
            );

            return Ok(SubmitMessageResult {
                advisor_turn,
                client_turn,
                stage_changed: false,
                current_stage: stage,
                opening_message: None,
                finished: true,
                finish_reason: Some(FinishReason::Completed),
                progress: Some(progress),
                simulation,
            });
        }

        let mut stage_changed = false;
        let mut opening_message = None;
        let mut current_stage = stage.clone();

        if progress.must_advance {
            simulation.advance_stage()?;
            let next_stage = product
                .stage(simulation.current_stage)
                .ok_or_else(|| stage_out_of_range(&simulation))?
                .clone();
            stage_changed = true;

            // Opener is best-effort: a backend hiccup must not undo the
            // advancement that already happened.
            if next_stage.is_client_initiated() {
                opening_message = self.open_stage(&mut simulation, product, &next_stage).await;
            }

            tracing::info!(
                trainee_id = %simulation.trainee_id,
                simulation_id = %simulation.id,
                from_stage = stage.number,
                to_stage = next_stage.number,
                "stage advanced"
            );
            current_stage = next_stage;
        }

        self.store.update(&simulation).await?;

        Ok(SubmitMessageResult {
            advisor_turn,
            client_turn,
            stage_changed,
            current_stage,
            opening_message,
            finished: false,
            finish_reason: None,
            progress: Some(progress),
            simulation,
        })
    }

    /// Terminal path shared by validator rejections and generator flags.
    async fn terminate(
        &self,
        mut simulation: Simulation,
        stage: Stage,
        advisor_turn: Turn,
        closing_line: String,
    ) -> Result<SubmitMessageResult, SubmitMessageError> {
        let client_turn = simulation.record_turn(&stage, Role::Client, closing_line);

        simulation.finish(FinishReason::ContextViolation)?;
        self.store.update(&simulation).await?;

        Ok(SubmitMessageResult {
            advisor_turn,
            client_turn,
            stage_changed: false,
            current_stage: stage,
            opening_message: None,
            finished: true,
            finish_reason: Some(FinishReason::ContextViolation),
            progress: None,
            simulation,
        })
    }

    /// Generation-failure policy: the advisor's message was genuinely sent,
    /// so it stays recorded; the caller retries the generation step.
    async fn fail_generation(
        &self,
        simulation: Simulation,
        err: TurnError,
    ) -> Result<SubmitMessageResult, SubmitMessageError> {
        tracing::error!(
            trainee_id = %simulation.trainee_id,
            simulation_id = %simulation.id,
            error = %err,
            "client turn generation failed"
        );
        self.store.update(&simulation).await?;
        Err(SubmitMessageError::Generation(err.to_string()))
    }

    /// Generates and records the opening line of a client-initiated stage.
    async fn open_stage(
        &self,
        simulation: &mut Simulation,
        product: &Product,
        next_stage: &Stage,
    ) -> Option<Turn> {
        let result = self
            .turns
            .generate(TurnRequest {
                product_name: product.name.clone(),
                profile: simulation.profile.clone(),
                stage: next_stage.clone(),
                history: simulation.history.clone(),
                mode: simulation.mode,
                kind: TurnKind::Opening,
            })
            .await;

        match result {
            Ok(opener) => Some(simulation.record_turn(next_stage, Role::Client, opener.text)),
            Err(err) => {
                tracing::warn!(
                    trainee_id = %simulation.trainee_id,
                    simulation_id = %simulation.id,
                    stage = next_stage.number,
                    error = %err,
                    "stage opener generation failed, continuing without it"
                );
                None
            }
        }
    }

    /// Fire-and-forget trigger of the post-completion analysis.
    fn trigger_analysis(&self, simulation: &Simulation) {
        let analyzer = self.analyzer.clone();
        let snapshot = simulation.clone();
        tokio::spawn(async move {
            if let Err(err) = analyzer.analyze(&snapshot).await {
                tracing::warn!(
                    simulation_id = %snapshot.id,
                    error = %err,
                    "performance analysis failed"
                );
            }
        });
    }
}

fn resolve_product(simulation: &Simulation) -> Result<&'static Product, SubmitMessageError> {
    catalog::resolve(&simulation.product_slug).ok_or_else(|| {
        SubmitMessageError::Domain(
            DomainError::new(ErrorCode::InternalError, "stored product missing from catalog")
                .with_detail("product", simulation.product_slug.clone()),
        )
    })
}

fn stage_out_of_range(simulation: &Simulation) -> SubmitMessageError {
    SubmitMessageError::Domain(
        DomainError::new(ErrorCode::InternalError, "stage index out of range")
            .with_detail("stage", simulation.current_stage.to_string()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::llm::scripted::{
        sample_profile, RecordingAnalyzer, ScriptedContextValidator, ScriptedTurnGenerator,
    };
    use crate::adapters::storage::InMemorySimulationStore;
    use crate::domain::simulation::Lifecycle;
    use crate::ports::GeneratedTurn;

    fn trainee() -> TraineeId {
        TraineeId::new("trainee-1").unwrap()
    }

    async fn seeded_store(product: &str, mode: SimulationMode) -> Arc<InMemorySimulationStore> {
        let store = Arc::new(InMemorySimulationStore::new());
        let product = catalog::resolve(product).unwrap();
        let simulation = Simulation::new(trainee(), product, mode, sample_profile());
        store.create(&simulation).await.unwrap();
        store
    }

    fn handler(
        store: Arc<InMemorySimulationStore>,
        validator: ScriptedContextValidator,
        turns: ScriptedTurnGenerator,
        analyzer: Arc<RecordingAnalyzer>,
    ) -> SubmitMessageHandler {
        SubmitMessageHandler::new(store, Arc::new(validator), Arc::new(turns), analyzer)
    }

    fn cmd(message: &str) -> SubmitMessageCommand {
        SubmitMessageCommand {
            trainee_id: trainee(),
            message: message.to_string(),
        }
    }

    #[tokio::test]
    async fn full_exchange_advances_stage() {
        let store = seeded_store("cuenta-ahorros", SimulationMode::Evaluative).await;
        let handler = handler(
            store.clone(),
            ScriptedContextValidator::accepting(),
            ScriptedTurnGenerator::new().with_reply("Buenos días, gracias por atenderme"),
            Arc::new(RecordingAnalyzer::new()),
        );

        let result = handler.handle(cmd("Buenos días, bienvenido al banco")).await.unwrap();

        assert!(result.stage_changed);
        assert_eq!(result.current_stage.number, 2);
        assert!(!result.finished);
        assert_eq!(result.simulation.history.len(), 2);

        let progress = result.progress.unwrap();
        assert!(progress.must_advance);
        assert_eq!(progress.exchange_count, 2);
        assert_eq!(progress.minimum_required, 2);

        let stored = store.find_active(&trainee()).await.unwrap().unwrap();
        assert_eq!(stored.current_stage, 2);
    }

    #[tokio::test]
    async fn empty_message_is_rejected_without_writes() {
        let store = seeded_store("cuenta-ahorros", SimulationMode::Evaluative).await;
        let handler = handler(
            store.clone(),
            ScriptedContextValidator::accepting(),
            ScriptedTurnGenerator::new(),
            Arc::new(RecordingAnalyzer::new()),
        );

        let before = store.find_active(&trainee()).await.unwrap().unwrap();
        let result = handler.handle(cmd("   ")).await;
        assert!(matches!(result, Err(SubmitMessageError::EmptyMessage)));

        let after = store.find_active(&trainee()).await.unwrap().unwrap();
        assert_eq!(before.history, after.history);
        assert_eq!(before.version, after.version);
    }

    #[tokio::test]
    async fn no_active_simulation_is_rejected() {
        let store = Arc::new(InMemorySimulationStore::new());
        let handler = handler(
            store,
            ScriptedContextValidator::accepting(),
            ScriptedTurnGenerator::new(),
            Arc::new(RecordingAnalyzer::new()),
        );

        let result = handler.handle(cmd("hola")).await;
        assert!(matches!(result, Err(SubmitMessageError::NoActiveSimulation(_))));
    }

    #[tokio::test]
    async fn paused_simulation_rejects_messages() {
        let store = seeded_store("cuenta-ahorros", SimulationMode::Evaluative).await;
        let mut sim = store.find_active(&trainee()).await.unwrap().unwrap();
        sim.pause().unwrap();
        store.update(&sim).await.unwrap();

        let handler = handler(
            store,
            ScriptedContextValidator::accepting(),
            ScriptedTurnGenerator::new(),
            Arc::new(RecordingAnalyzer::new()),
        );

        let result = handler.handle(cmd("hola")).await;
        assert!(matches!(result, Err(SubmitMessageError::NoActiveSimulation(_))));
    }

    #[tokio::test]
    async fn context_violation_terminates_without_advancing() {
        let store = seeded_store("cuenta-ahorros", SimulationMode::Evaluative).await;
        let handler = handler(
            store.clone(),
            ScriptedContextValidator::accepting().with_rejection("habla de fútbol"),
            ScriptedTurnGenerator::new(),
            Arc::new(RecordingAnalyzer::new()),
        );

        let result = handler.handle(cmd("¿Vio el golazo de anoche?")).await.unwrap();

        assert!(result.finished);
        assert_eq!(result.finish_reason, Some(FinishReason::ContextViolation));
        assert!(!result.stage_changed);
        assert!(result.progress.is_none());
        assert_eq!(result.simulation.current_stage, 1);
        assert_eq!(result.simulation.lifecycle, Lifecycle::Finished);

        // Advisor message plus the synthetic closing line
        assert_eq!(result.simulation.history.len(), 2);
        assert_eq!(result.client_turn.sender, Role::Client);
        assert_eq!(result.client_turn.text, CLOSING_LINE);

        // Moved out of the active set
        assert!(store.find_active(&trainee()).await.unwrap().is_none());
        let finished = store.find_latest_finished(&trainee()).await.unwrap().unwrap();
        assert_eq!(finished.finish_reason, Some(FinishReason::ContextViolation));
    }

    #[tokio::test]
    async fn generator_must_end_flag_is_treated_like_a_rejection() {
        let store = seeded_store("cuenta-ahorros", SimulationMode::Evaluative).await;
        let handler = handler(
            store.clone(),
            ScriptedContextValidator::accepting(),
            ScriptedTurnGenerator::new().with_turn(GeneratedTurn {
                text: "Esto no tiene sentido, me retiro.".to_string(),
                must_end_simulation: true,
                guidance: None,
            }),
            Arc::new(RecordingAnalyzer::new()),
        );

        let result = handler.handle(cmd("da igual, compre lo que sea")).await.unwrap();

        assert!(result.finished);
        assert_eq!(result.finish_reason, Some(FinishReason::ContextViolation));
        assert!(!result.stage_changed);
        assert_eq!(result.client_turn.text, "Esto no tiene sentido, me retiro.");
    }

    #[tokio::test]
    async fn generation_failure_keeps_advisor_turn_recorded() {
        let store = seeded_store("cuenta-ahorros", SimulationMode::Evaluative).await;
        let handler = handler(
            store.clone(),
            ScriptedContextValidator::accepting(),
            ScriptedTurnGenerator::new().with_failure("backend caído"),
            Arc::new(RecordingAnalyzer::new()),
        );

        let result = handler.handle(cmd("Buenos días")).await;
        assert!(matches!(result, Err(SubmitMessageError::Generation(_))));

        let stored = store.find_active(&trainee()).await.unwrap().unwrap();
        assert_eq!(stored.lifecycle, Lifecycle::InProgress);
        assert_eq!(stored.current_stage, 1);
        assert_eq!(stored.history.len(), 1);
        assert_eq!(stored.history.last().unwrap().sender, Role::Advisor);
    }

    #[tokio::test]
    async fn advancing_into_client_initiated_stage_appends_opener() {
        let store = seeded_store("cuenta-ahorros", SimulationMode::Evaluative).await;

        // Walk to stage 3 so the next advancement lands on client-initiated stage 4
        let mut sim = store.find_active(&trainee()).await.unwrap().unwrap();
        sim.advance_stage().unwrap();
        sim.advance_stage().unwrap();
        store.update(&sim).await.unwrap();

        let handler = handler(
            store.clone(),
            ScriptedContextValidator::accepting(),
            ScriptedTurnGenerator::new()
                .with_reply("Sí, me interesa cómo funciona")
                .with_reply("¿Y esa cuenta no cobra cuota de manejo?"),
            Arc::new(RecordingAnalyzer::new()),
        );

        let result = handler.handle(cmd("Le presento la cuenta de ahorros")).await.unwrap();

        assert!(result.stage_changed);
        assert_eq!(result.current_stage.number, 4);

        let opener = result.opening_message.unwrap();
        assert_eq!(opener.sender, Role::Client);
        assert_eq!(opener.stage_number, 4);

        // Opener counts as the stage's first exchange
        assert_eq!(result.simulation.history.exchanges_in_stage(4), 1);
    }

    #[tokio::test]
    async fn opener_failure_does_not_undo_advancement() {
        let store = seeded_store("cuenta-ahorros", SimulationMode::Evaluative).await;
        let mut sim = store.find_active(&trainee()).await.unwrap().unwrap();
        sim.advance_stage().unwrap();
        sim.advance_stage().unwrap();
        store.update(&sim).await.unwrap();

        let handler = handler(
            store.clone(),
            ScriptedContextValidator::accepting(),
            ScriptedTurnGenerator::new()
                .with_reply("Sí, me interesa")
                .with_failure("backend caído"),
            Arc::new(RecordingAnalyzer::new()),
        );

        let result = handler.handle(cmd("Le presento la cuenta")).await.unwrap();

        assert!(result.stage_changed);
        assert_eq!(result.current_stage.number, 4);
        assert!(result.opening_message.is_none());

        let stored = store.find_active(&trainee()).await.unwrap().unwrap();
        assert_eq!(stored.current_stage, 4);
        assert_eq!(stored.history.exchanges_in_stage(4), 0);
    }

    #[tokio::test]
    async fn completing_last_stage_finishes_and_triggers_analysis() {
        let store = seeded_store("cuenta-ahorros", SimulationMode::Evaluative).await;
        let mut sim = store.find_active(&trainee()).await.unwrap().unwrap();
        for _ in 1..sim.total_stages {
            sim.advance_stage().unwrap();
        }
        store.update(&sim).await.unwrap();

        let analyzer = Arc::new(RecordingAnalyzer::new());
        let handler = handler(
            store.clone(),
            ScriptedContextValidator::accepting(),
            ScriptedTurnGenerator::new().with_reply("Hasta luego, gracias por todo"),
            analyzer.clone(),
        );

        let result = handler.handle(cmd("Fue un gusto atenderle, hasta pronto")).await.unwrap();

        assert!(result.finished);
        assert_eq!(result.finish_reason, Some(FinishReason::Completed));
        assert!(!result.stage_changed);
        assert_eq!(result.simulation.lifecycle, Lifecycle::Finished);

        // Analysis runs on a spawned task
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(analyzer.call_count(), 1);

        let finished = store.find_latest_finished(&trainee()).await.unwrap().unwrap();
        assert_eq!(finished.finish_reason, Some(FinishReason::Completed));
    }

    #[tokio::test]
    async fn analysis_failure_does_not_affect_completion() {
        let store = seeded_store("cuenta-ahorros", SimulationMode::Evaluative).await;
        let mut sim = store.find_active(&trainee()).await.unwrap().unwrap();
        for _ in 1..sim.total_stages {
            sim.advance_stage().unwrap();
        }
        store.update(&sim).await.unwrap();

        let handler = handler(
            store.clone(),
            ScriptedContextValidator::accepting(),
            ScriptedTurnGenerator::new().with_reply("Hasta luego"),
            Arc::new(RecordingAnalyzer::failing()),
        );

        let result = handler.handle(cmd("Hasta pronto")).await.unwrap();
        assert_eq!(result.finish_reason, Some(FinishReason::Completed));
    }

    #[tokio::test]
    async fn learning_mode_records_guidance_notes() {
        let store = seeded_store("cuenta-ahorros", SimulationMode::Learning).await;
        let handler = handler(
            store.clone(),
            ScriptedContextValidator::accepting(),
            ScriptedTurnGenerator::new().with_turn(GeneratedTurn {
                text: "Gracias, igualmente".to_string(),
                must_end_simulation: false,
                guidance: Some("Buen saludo, faltó presentarse por su nombre".to_string()),
            }),
            Arc::new(RecordingAnalyzer::new()),
        );

        let result = handler.handle(cmd("Buenos días")).await.unwrap();

        assert_eq!(result.simulation.notes.len(), 1);
        assert_eq!(result.simulation.notes[0].stage_number, 1);
    }

    #[tokio::test]
    async fn evaluative_mode_ignores_guidance() {
        let store = seeded_store("cuenta-ahorros", SimulationMode::Evaluative).await;
        let handler = handler(
            store.clone(),
            ScriptedContextValidator::accepting(),
            ScriptedTurnGenerator::new().with_turn(GeneratedTurn {
                text: "Gracias".to_string(),
                must_end_simulation: false,
                guidance: Some("nota que no debería guardarse".to_string()),
            }),
            Arc::new(RecordingAnalyzer::new()),
        );

        let result = handler.handle(cmd("Buenos días")).await.unwrap();
        assert!(result.simulation.notes.is_empty());
    }

    #[tokio::test]
    async fn reply_request_carries_the_advisor_message() {
        let store = seeded_store("cuenta-ahorros", SimulationMode::Evaluative).await;
        let turns = ScriptedTurnGenerator::new().with_reply("Claro");
        let requests_handle = turns.get_requests();
        assert!(requests_handle.is_empty());

        let turns_arc = Arc::new(turns);
        let handler = SubmitMessageHandler::new(
            store,
            Arc::new(ScriptedContextValidator::accepting()),
            turns_arc.clone(),
            Arc::new(RecordingAnalyzer::new()),
        );

        handler.handle(cmd("¿Cómo está hoy?")).await.unwrap();

        let requests = turns_arc.get_requests();
        assert_eq!(requests.len(), 1);
        match &requests[0].kind {
            TurnKind::Reply { advisor_message } => {
                assert_eq!(advisor_message, "¿Cómo está hoy?")
            }
            TurnKind::Opening => panic!("expected a reply request"),
        }
        // History passed to the generator already contains the advisor turn
        assert_eq!(requests[0].history.len(), 1);
    }
}
