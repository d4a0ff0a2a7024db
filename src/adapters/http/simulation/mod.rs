//! HTTP adapter for the simulation engine.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::SimulationAppState;
pub use routes::router;
