//! PostgreSQL adapters.

mod simulation_store;

pub use simulation_store::PostgresSimulationStore;
