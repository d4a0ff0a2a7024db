//! PauseSimulationHandler - suspend an in-progress simulation.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, TraineeId};
use crate::domain::simulation::Simulation;
use crate::ports::{SimulationStore, StoreError};

/// Command to pause a simulation.
#[derive(Debug, Clone)]
pub struct PauseSimulationCommand {
    pub trainee_id: TraineeId,
}

/// Result of pausing.
#[derive(Debug, Clone)]
pub struct PauseSimulationResult {
    pub simulation: Simulation,
}

/// Error type for pausing simulations.
#[derive(Debug)]
pub enum PauseSimulationError {
    /// No active simulation for this trainee.
    NoActiveSimulation(TraineeId),
    /// Another writer touched the simulation concurrently; retryable.
    Conflict(TraineeId),
    /// Storage error.
    Storage(String),
    /// Domain error (e.g. already paused).
    Domain(DomainError),
}

impl std::fmt::Display for PauseSimulationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PauseSimulationError::NoActiveSimulation(id) => {
                write!(f, "No active simulation for trainee {}", id)
            }
            PauseSimulationError::Conflict(id) => {
                write!(f, "Simulation for trainee {} was modified concurrently", id)
            }
            PauseSimulationError::Storage(err) => write!(f, "Storage error: {}", err),
            PauseSimulationError::Domain(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for PauseSimulationError {}

impl From<DomainError> for PauseSimulationError {
    fn from(err: DomainError) -> Self {
        PauseSimulationError::Domain(err)
    }
}

impl From<StoreError> for PauseSimulationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => PauseSimulationError::NoActiveSimulation(id),
            StoreError::VersionConflict { trainee_id, .. } => {
                PauseSimulationError::Conflict(trainee_id)
            }
            other => PauseSimulationError::Storage(other.to_string()),
        }
    }
}

/// Handler for pausing simulations.
pub struct PauseSimulationHandler {
    store: Arc<dyn SimulationStore>,
}

impl PauseSimulationHandler {
    pub fn new(store: Arc<dyn SimulationStore>) -> Self {
        Self { store }
    }

    pub async fn handle(
        &self,
        cmd: PauseSimulationCommand,
    ) -> Result<PauseSimulationResult, PauseSimulationError> {
        let mut simulation = self
            .store
            .find_active(&cmd.trainee_id)
            .await?
            .ok_or_else(|| PauseSimulationError::NoActiveSimulation(cmd.trainee_id.clone()))?;

        simulation.pause()?;
        self.store.update(&simulation).await?;

        tracing::info!(
            trainee_id = %simulation.trainee_id,
            simulation_id = %simulation.id,
            "simulation paused"
        );

        Ok(PauseSimulationResult { simulation })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::llm::scripted::sample_profile;
    use crate::adapters::storage::InMemorySimulationStore;
    use crate::domain::catalog;
    use crate::domain::simulation::{Lifecycle, SimulationMode};

    fn trainee() -> TraineeId {
        TraineeId::new("trainee-1").unwrap()
    }

    async fn seeded_store() -> Arc<InMemorySimulationStore> {
        let store = Arc::new(InMemorySimulationStore::new());
        let product = catalog::resolve("cuenta-ahorros").unwrap();
        let sim = Simulation::new(
            trainee(),
            product,
            SimulationMode::Learning,
            sample_profile(),
        );
        store.create(&sim).await.unwrap();
        store
    }

    #[tokio::test]
    async fn pause_suspends_the_simulation() {
        let store = seeded_store().await;
        let handler = PauseSimulationHandler::new(store.clone());

        let result = handler
            .handle(PauseSimulationCommand { trainee_id: trainee() })
            .await
            .unwrap();

        assert_eq!(result.simulation.lifecycle, Lifecycle::Paused);

        let stored = store.find_active(&trainee()).await.unwrap().unwrap();
        assert_eq!(stored.lifecycle, Lifecycle::Paused);
    }

    #[tokio::test]
    async fn pausing_twice_is_a_domain_error() {
        let store = seeded_store().await;
        let handler = PauseSimulationHandler::new(store);

        let cmd = PauseSimulationCommand { trainee_id: trainee() };
        handler.handle(cmd.clone()).await.unwrap();

        let result = handler.handle(cmd).await;
        assert!(matches!(result, Err(PauseSimulationError::Domain(_))));
    }

    #[tokio::test]
    async fn pause_without_simulation_fails() {
        let store = Arc::new(InMemorySimulationStore::new());
        let handler = PauseSimulationHandler::new(store);

        let result = handler
            .handle(PauseSimulationCommand { trainee_id: trainee() })
            .await;

        assert!(matches!(
            result,
            Err(PauseSimulationError::NoActiveSimulation(_))
        ));
    }
}
