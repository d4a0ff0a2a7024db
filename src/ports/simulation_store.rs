//! Simulation Store Port - durable storage for simulations keyed by trainee.
//!
//! The store enforces the two invariants the engine cannot enforce alone:
//! at most one non-terminal simulation per trainee, and optimistic version
//! checking so two interleaved writers cannot corrupt stage index or history.

use async_trait::async_trait;

use crate::domain::foundation::TraineeId;
use crate::domain::simulation::Simulation;

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("trainee {0} already has an active simulation")]
    DuplicateActive(TraineeId),

    #[error("no simulation found for trainee {0}")]
    NotFound(TraineeId),

    #[error("simulation for trainee {trainee_id} was modified concurrently (expected version {expected})")]
    VersionConflict { trainee_id: TraineeId, expected: i64 },

    #[error("failed to serialize simulation: {0}")]
    Serialization(String),

    #[error("database error: {0}")]
    Database(String),
}

/// Port for persisting and loading simulations.
#[async_trait]
pub trait SimulationStore: Send + Sync {
    /// Persists a brand-new simulation.
    ///
    /// # Errors
    /// Returns `StoreError::DuplicateActive` when the trainee already has a
    /// non-terminal simulation.
    async fn create(&self, simulation: &Simulation) -> Result<(), StoreError>;

    /// Loads the trainee's non-terminal simulation, if any.
    async fn find_active(&self, trainee_id: &TraineeId) -> Result<Option<Simulation>, StoreError>;

    /// Persists a mutated simulation.
    ///
    /// The stored row must still carry `simulation.version`; on success the
    /// stored version is bumped by one.
    ///
    /// # Errors
    /// Returns `StoreError::VersionConflict` when another writer got there
    /// first, `StoreError::NotFound` when the simulation no longer exists.
    async fn update(&self, simulation: &Simulation) -> Result<(), StoreError>;

    /// Loads the trainee's most recently finished simulation, if any.
    ///
    /// Read-only access for downstream consumers (evidence export etc.);
    /// finished simulations are never mutated.
    async fn find_latest_finished(
        &self,
        trainee_id: &TraineeId,
    ) -> Result<Option<Simulation>, StoreError>;
}
