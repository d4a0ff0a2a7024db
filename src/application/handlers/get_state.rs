//! GetStateHandler - read-only snapshot of the trainee's simulation.

use std::sync::Arc;

use crate::domain::catalog::{self, Stage};
use crate::domain::foundation::{DomainError, ErrorCode, TraineeId};
use crate::domain::simulation::Simulation;
use crate::ports::{SimulationStore, StoreError};

/// Query for the current simulation state.
#[derive(Debug, Clone)]
pub struct GetStateQuery {
    pub trainee_id: TraineeId,
}

/// Snapshot of the simulation: aggregate plus the current stage descriptor.
#[derive(Debug, Clone)]
pub struct GetStateResult {
    pub simulation: Simulation,
    pub current_stage: Stage,
}

/// Error type for state queries.
#[derive(Debug)]
pub enum GetStateError {
    /// No active simulation for this trainee.
    NotFound(TraineeId),
    /// Storage error.
    Storage(String),
    /// Domain error.
    Domain(DomainError),
}

impl std::fmt::Display for GetStateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GetStateError::NotFound(id) => {
                write!(f, "No active simulation for trainee {}", id)
            }
            GetStateError::Storage(err) => write!(f, "Storage error: {}", err),
            GetStateError::Domain(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for GetStateError {}

impl From<StoreError> for GetStateError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => GetStateError::NotFound(id),
            other => GetStateError::Storage(other.to_string()),
        }
    }
}

/// Handler for state queries. Performs no writes.
pub struct GetStateHandler {
    store: Arc<dyn SimulationStore>,
}

impl GetStateHandler {
    pub fn new(store: Arc<dyn SimulationStore>) -> Self {
        Self { store }
    }

    pub async fn handle(&self, query: GetStateQuery) -> Result<GetStateResult, GetStateError> {
        let simulation = self
            .store
            .find_active(&query.trainee_id)
            .await?
            .ok_or_else(|| GetStateError::NotFound(query.trainee_id.clone()))?;

        let current_stage = catalog::resolve(&simulation.product_slug)
            .and_then(|p| p.stage(simulation.current_stage))
            .cloned()
            .ok_or_else(|| {
                GetStateError::Domain(DomainError::new(
                    ErrorCode::InternalError,
                    "stored product missing from catalog",
                ))
            })?;

        Ok(GetStateResult {
            simulation,
            current_stage,
        })
    }
}
