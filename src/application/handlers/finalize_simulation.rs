//! FinalizeSimulationHandler - trainee-initiated early termination.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, TraineeId};
use crate::domain::simulation::{ConversationHistory, FinishReason, Simulation};
use crate::ports::{SimulationStore, StoreError};

/// Command to finalize a simulation manually.
#[derive(Debug, Clone)]
pub struct FinalizeSimulationCommand {
    pub trainee_id: TraineeId,
}

/// Session summary returned on manual termination.
///
/// The performance analysis collaborator deliberately does not run here;
/// only automatic completion triggers it.
#[derive(Debug, Clone)]
pub struct FinalizeSimulationResult {
    pub simulation: Simulation,
    pub stage_reached: u32,
    pub total_stages: u32,
    pub message_count: usize,
    pub duration_secs: i64,
    pub history: ConversationHistory,
}

/// Error type for finalizing simulations.
#[derive(Debug)]
pub enum FinalizeSimulationError {
    /// No active simulation for this trainee.
    NoActiveSimulation(TraineeId),
    /// Another writer touched the simulation concurrently; retryable.
    Conflict(TraineeId),
    /// Storage error.
    Storage(String),
    /// Domain error.
    Domain(DomainError),
}

impl std::fmt::Display for FinalizeSimulationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FinalizeSimulationError::NoActiveSimulation(id) => {
                write!(f, "No active simulation for trainee {}", id)
            }
            FinalizeSimulationError::Conflict(id) => {
                write!(f, "Simulation for trainee {} was modified concurrently", id)
            }
            FinalizeSimulationError::Storage(err) => write!(f, "Storage error: {}", err),
            FinalizeSimulationError::Domain(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for FinalizeSimulationError {}

impl From<DomainError> for FinalizeSimulationError {
    fn from(err: DomainError) -> Self {
        FinalizeSimulationError::Domain(err)
    }
}

impl From<StoreError> for FinalizeSimulationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => FinalizeSimulationError::NoActiveSimulation(id),
            StoreError::VersionConflict { trainee_id, .. } => {
                FinalizeSimulationError::Conflict(trainee_id)
            }
            other => FinalizeSimulationError::Storage(other.to_string()),
        }
    }
}

/// Handler for manual termination.
pub struct FinalizeSimulationHandler {
    store: Arc<dyn SimulationStore>,
}

impl FinalizeSimulationHandler {
    pub fn new(store: Arc<dyn SimulationStore>) -> Self {
        Self { store }
    }

    pub async fn handle(
        &self,
        cmd: FinalizeSimulationCommand,
    ) -> Result<FinalizeSimulationResult, FinalizeSimulationError> {
        let mut simulation = self
            .store
            .find_active(&cmd.trainee_id)
            .await?
            .ok_or_else(|| FinalizeSimulationError::NoActiveSimulation(cmd.trainee_id.clone()))?;

        simulation.finish(FinishReason::Manual)?;
        self.store.update(&simulation).await?;

        tracing::info!(
            trainee_id = %simulation.trainee_id,
            simulation_id = %simulation.id,
            stage_reached = simulation.current_stage,
            "simulation finalized manually"
        );

        Ok(FinalizeSimulationResult {
            stage_reached: simulation.current_stage,
            total_stages: simulation.total_stages,
            message_count: simulation.history.len(),
            duration_secs: simulation.duration_secs(),
            history: simulation.history.clone(),
            simulation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::llm::scripted::sample_profile;
    use crate::adapters::storage::InMemorySimulationStore;
    use crate::domain::catalog;
    use crate::domain::simulation::{Lifecycle, Role, SimulationMode};

    fn trainee() -> TraineeId {
        TraineeId::new("trainee-1").unwrap()
    }

    async fn seeded_store() -> Arc<InMemorySimulationStore> {
        let store = Arc::new(InMemorySimulationStore::new());
        let product = catalog::resolve("cuenta-ahorros").unwrap();
        let sim = Simulation::new(
            trainee(),
            product,
            SimulationMode::Evaluative,
            sample_profile(),
        );
        store.create(&sim).await.unwrap();
        store
    }

    #[tokio::test]
    async fn finalize_marks_manual_finish_and_returns_summary() {
        let store = seeded_store().await;

        let mut sim = store.find_active(&trainee()).await.unwrap().unwrap();
        let product = catalog::resolve("cuenta-ahorros").unwrap();
        let stage = product.stage(1).unwrap();
        sim.record_turn(stage, Role::Advisor, "Buenos días");
        sim.record_turn(stage, Role::Client, "Buenos días, gracias");
        sim.advance_stage().unwrap();
        store.update(&sim).await.unwrap();

        let handler = FinalizeSimulationHandler::new(store.clone());
        let result = handler
            .handle(FinalizeSimulationCommand { trainee_id: trainee() })
            .await
            .unwrap();

        assert_eq!(result.simulation.lifecycle, Lifecycle::Finished);
        assert_eq!(result.simulation.finish_reason, Some(FinishReason::Manual));
        assert_eq!(result.stage_reached, 2);
        assert_eq!(result.total_stages, 7);
        assert_eq!(result.message_count, 2);
        assert!(result.duration_secs >= 0);
        assert_eq!(result.history.len(), 2);

        // No longer active, readable from the finished set
        assert!(store.find_active(&trainee()).await.unwrap().is_none());
        let finished = store.find_latest_finished(&trainee()).await.unwrap().unwrap();
        assert_eq!(finished.finish_reason, Some(FinishReason::Manual));
    }

    #[tokio::test]
    async fn finalize_without_active_simulation_fails_without_writes() {
        let store = Arc::new(InMemorySimulationStore::new());
        let handler = FinalizeSimulationHandler::new(store.clone());

        let result = handler
            .handle(FinalizeSimulationCommand { trainee_id: trainee() })
            .await;

        assert!(matches!(
            result,
            Err(FinalizeSimulationError::NoActiveSimulation(_))
        ));
        assert_eq!(store.finished_count().await, 0);
    }

    #[tokio::test]
    async fn paused_simulation_can_be_finalized() {
        let store = seeded_store().await;
        let mut sim = store.find_active(&trainee()).await.unwrap().unwrap();
        sim.pause().unwrap();
        store.update(&sim).await.unwrap();

        let handler = FinalizeSimulationHandler::new(store);
        let result = handler
            .handle(FinalizeSimulationCommand { trainee_id: trainee() })
            .await
            .unwrap();

        assert_eq!(result.simulation.finish_reason, Some(FinishReason::Manual));
    }
}
