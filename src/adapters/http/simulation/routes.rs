//! Route definitions for the simulation endpoints.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{
    enviar_mensaje, estado_simulacion, finalizar_simulacion, iniciar_simulacion,
    pausar_simulacion, reanudar_simulacion, SimulationAppState,
};

/// Builds the simulation router.
pub fn router(state: SimulationAppState) -> Router {
    Router::new()
        .route("/simulaciones", post(iniciar_simulacion))
        .route("/simulaciones/:usuario_id", get(estado_simulacion))
        .route("/simulaciones/:usuario_id/mensajes", post(enviar_mensaje))
        .route("/simulaciones/:usuario_id/pausa", post(pausar_simulacion))
        .route(
            "/simulaciones/:usuario_id/reanudacion",
            post(reanudar_simulacion),
        )
        .route(
            "/simulaciones/:usuario_id/finalizacion",
            post(finalizar_simulacion),
        )
        .with_state(state)
}
