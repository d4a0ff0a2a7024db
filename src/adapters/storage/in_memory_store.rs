//! In-Memory Simulation Store Adapter
//!
//! Keeps simulations in process memory. Useful for tests and development;
//! production deployments use the PostgreSQL adapter.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::TraineeId;
use crate::domain::simulation::Simulation;
use crate::ports::{SimulationStore, StoreError};

/// In-memory store with the same uniqueness and versioning semantics as the
/// durable adapter.
#[derive(Debug, Clone, Default)]
pub struct InMemorySimulationStore {
    active: Arc<RwLock<HashMap<TraineeId, Simulation>>>,
    finished: Arc<RwLock<Vec<Simulation>>>,
}

impl InMemorySimulationStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of active simulations currently held.
    pub async fn active_count(&self) -> usize {
        self.active.read().await.len()
    }

    /// Number of finished simulations retained.
    pub async fn finished_count(&self) -> usize {
        self.finished.read().await.len()
    }
}

#[async_trait]
impl SimulationStore for InMemorySimulationStore {
    async fn create(&self, simulation: &Simulation) -> Result<(), StoreError> {
        let mut active = self.active.write().await;
        if active.contains_key(&simulation.trainee_id) {
            return Err(StoreError::DuplicateActive(simulation.trainee_id.clone()));
        }
        active.insert(simulation.trainee_id.clone(), simulation.clone());
        Ok(())
    }

    async fn find_active(&self, trainee_id: &TraineeId) -> Result<Option<Simulation>, StoreError> {
        let active = self.active.read().await;
        Ok(active.get(trainee_id).cloned())
    }

    async fn update(&self, simulation: &Simulation) -> Result<(), StoreError> {
        let mut active = self.active.write().await;
        let stored = active
            .get(&simulation.trainee_id)
            .ok_or_else(|| StoreError::NotFound(simulation.trainee_id.clone()))?;

        if stored.version != simulation.version {
            return Err(StoreError::VersionConflict {
                trainee_id: simulation.trainee_id.clone(),
                expected: simulation.version,
            });
        }

        let mut updated = simulation.clone();
        updated.version += 1;

        if updated.lifecycle.is_terminal() {
            active.remove(&simulation.trainee_id);
            self.finished.write().await.push(updated);
        } else {
            active.insert(simulation.trainee_id.clone(), updated);
        }
        Ok(())
    }

    async fn find_latest_finished(
        &self,
        trainee_id: &TraineeId,
    ) -> Result<Option<Simulation>, StoreError> {
        let finished = self.finished.read().await;
        Ok(finished
            .iter()
            .rev()
            .find(|s| &s.trainee_id == trainee_id)
            .cloned())
    }
}
