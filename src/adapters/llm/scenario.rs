//! LLM implementation of the ScenarioGenerator port.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::simulation::ClientProfile;
use crate::ports::{
    AiProvider, ChatRole, CompletionRequest, RequestMetadata, ScenarioError, ScenarioGenerator,
    ScenarioRequest,
};

use super::extract_json;

/// Generates a client persona by asking the backend for a JSON profile.
pub struct LlmScenarioGenerator {
    provider: Arc<dyn AiProvider>,
}

impl LlmScenarioGenerator {
    pub fn new(provider: Arc<dyn AiProvider>) -> Self {
        Self { provider }
    }

    fn build_request(&self, request: &ScenarioRequest) -> CompletionRequest {
        let system = "Eres el generador de escenarios de un simulador de ventas bancarias. \
                      Respondes únicamente con un objeto JSON, sin texto adicional, con las claves: \
                      name, age, occupation, current_situation, motivation, \
                      knowledge_level (basic|intermediate|advanced), \
                      risk_profile (conservative|moderate|aggressive), \
                      financial_goal, background, gender (female|male).";

        let instruction = format!(
            "Crea el perfil de un cliente para una conversación de venta de \"{}\".\n\
             Tipo psicológico: {} ({}).\n\
             Segmento: {} ({}).\n\
             El perfil debe ser verosímil para el mercado local y coherente con el producto.",
            request.product_name,
            request.client_type.display_name(),
            request.client_type.descriptor(),
            request.segment.display_name(),
            request.segment.descriptor(),
        );

        // Trainee identity is unknown at this point of the start flow; the
        // operation tag is enough for tracing.
        let metadata = RequestMetadata::new(
            crate::domain::foundation::TraineeId::new("scenario").unwrap(),
            None,
            "scenario_generation",
        );

        CompletionRequest::new(metadata)
            .with_system_prompt(system)
            .with_message(ChatRole::User, instruction)
            .with_max_tokens(700)
            .with_temperature(0.9)
    }
}

#[async_trait]
impl ScenarioGenerator for LlmScenarioGenerator {
    async fn generate(&self, request: ScenarioRequest) -> Result<ClientProfile, ScenarioError> {
        let completion = self.build_request(&request);

        let response = self
            .provider
            .complete(completion)
            .await
            .map_err(|e| ScenarioError::backend(e.to_string()))?;

        let json = extract_json(&response.content)
            .ok_or_else(|| ScenarioError::invalid_response("no JSON object in response"))?;

        serde_json::from_str::<ClientProfile>(json)
            .map_err(|e| ScenarioError::invalid_response(e.to_string()))
    }
}
