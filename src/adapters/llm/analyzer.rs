//! LLM implementation of the PerformanceAnalyzer port.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::simulation::{Role, Simulation};
use crate::ports::{
    AiProvider, AnalysisError, ChatRole, CompletionRequest, PerformanceAnalyzer, RequestMetadata,
};

/// Asks the backend for a post-session performance review.
///
/// The review itself is consumed by the reporting layer; this adapter only
/// requests it and logs the outcome.
pub struct LlmPerformanceAnalyzer {
    provider: Arc<dyn AiProvider>,
}

impl LlmPerformanceAnalyzer {
    pub fn new(provider: Arc<dyn AiProvider>) -> Self {
        Self { provider }
    }

    fn build_request(&self, simulation: &Simulation) -> CompletionRequest {
        let system = "Eres el evaluador de un simulador de ventas bancarias. Analiza el \
                      desempeño del asesor en formación: manejo de etapas, escucha activa y \
                      cierre. Sé concreto y constructivo.";

        let transcript = simulation
            .history
            .turns()
            .iter()
            .map(|t| {
                let who = match t.sender {
                    Role::Advisor => "Asesor",
                    Role::Client => "Cliente",
                };
                format!("[Etapa {}] {}: {}", t.stage_number, who, t.text)
            })
            .collect::<Vec<_>>()
            .join("\n");

        let instruction = format!(
            "Simulación completada: producto {}, {} de {} etapas, {} mensajes, {} segundos.\n\n{}",
            simulation.product_slug,
            simulation.current_stage,
            simulation.total_stages,
            simulation.history.len(),
            simulation.duration_secs(),
            transcript,
        );

        let metadata = RequestMetadata::new(
            simulation.trainee_id.clone(),
            Some(simulation.id),
            "performance_analysis",
        );

        CompletionRequest::new(metadata)
            .with_system_prompt(system)
            .with_message(ChatRole::User, instruction)
            .with_max_tokens(800)
            .with_temperature(0.3)
    }
}

#[async_trait]
impl PerformanceAnalyzer for LlmPerformanceAnalyzer {
    async fn analyze(&self, simulation: &Simulation) -> Result<(), AnalysisError> {
        let request = self.build_request(simulation);

        let response = self
            .provider
            .complete(request)
            .await
            .map_err(|e| AnalysisError::backend(e.to_string()))?;

        tracing::info!(
            simulation_id = %simulation.id,
            trainee_id = %simulation.trainee_id,
            chars = response.content.len(),
            "performance analysis generated"
        );
        Ok(())
    }
}
