//! ResumeSimulationHandler - resume a paused simulation.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, TraineeId};
use crate::domain::simulation::Simulation;
use crate::ports::{SimulationStore, StoreError};

/// Command to resume a simulation.
#[derive(Debug, Clone)]
pub struct ResumeSimulationCommand {
    pub trainee_id: TraineeId,
}

/// Result of resuming.
#[derive(Debug, Clone)]
pub struct ResumeSimulationResult {
    pub simulation: Simulation,
}

/// Error type for resuming simulations.
#[derive(Debug)]
pub enum ResumeSimulationError {
    /// No active simulation for this trainee.
    NoActiveSimulation(TraineeId),
    /// Another writer touched the simulation concurrently; retryable.
    Conflict(TraineeId),
    /// Storage error.
    Storage(String),
    /// Domain error (e.g. not paused).
    Domain(DomainError),
}

impl std::fmt::Display for ResumeSimulationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResumeSimulationError::NoActiveSimulation(id) => {
                write!(f, "No active simulation for trainee {}", id)
            }
            ResumeSimulationError::Conflict(id) => {
                write!(f, "Simulation for trainee {} was modified concurrently", id)
            }
            ResumeSimulationError::Storage(err) => write!(f, "Storage error: {}", err),
            ResumeSimulationError::Domain(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ResumeSimulationError {}

impl From<DomainError> for ResumeSimulationError {
    fn from(err: DomainError) -> Self {
        ResumeSimulationError::Domain(err)
    }
}

impl From<StoreError> for ResumeSimulationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ResumeSimulationError::NoActiveSimulation(id),
            StoreError::VersionConflict { trainee_id, .. } => {
                ResumeSimulationError::Conflict(trainee_id)
            }
            other => ResumeSimulationError::Storage(other.to_string()),
        }
    }
}

/// Handler for resuming simulations.
pub struct ResumeSimulationHandler {
    store: Arc<dyn SimulationStore>,
}

impl ResumeSimulationHandler {
    pub fn new(store: Arc<dyn SimulationStore>) -> Self {
        Self { store }
    }

    pub async fn handle(
        &self,
        cmd: ResumeSimulationCommand,
    ) -> Result<ResumeSimulationResult, ResumeSimulationError> {
        let mut simulation = self
            .store
            .find_active(&cmd.trainee_id)
            .await?
            .ok_or_else(|| ResumeSimulationError::NoActiveSimulation(cmd.trainee_id.clone()))?;

        simulation.resume()?;
        self.store.update(&simulation).await?;

        tracing::info!(
            trainee_id = %simulation.trainee_id,
            simulation_id = %simulation.id,
            "simulation resumed"
        );

        Ok(ResumeSimulationResult { simulation })
    }
}
