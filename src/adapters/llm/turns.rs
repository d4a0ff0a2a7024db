//! LLM implementation of the ClientTurnGenerator port.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use crate::domain::simulation::{Role, SimulationMode};
use crate::ports::{
    AiProvider, ChatMessage, ChatRole, ClientTurnGenerator, CompletionRequest, GeneratedTurn,
    RequestMetadata, TurnError, TurnKind, TurnRequest,
};

use super::extract_json;

/// Produces the simulated client's utterances through the backend.
pub struct LlmClientTurnGenerator {
    provider: Arc<dyn AiProvider>,
}

#[derive(Debug, Deserialize)]
struct TurnWire {
    text: String,
    #[serde(default)]
    must_end: bool,
    #[serde(default)]
    guidance: Option<String>,
}

impl LlmClientTurnGenerator {
    pub fn new(provider: Arc<dyn AiProvider>) -> Self {
        Self { provider }
    }

    fn build_request(&self, request: &TurnRequest) -> CompletionRequest {
        let guidance_clause = match request.mode {
            SimulationMode::Learning => {
                "Incluye en \"guidance\" una observación breve para el formador sobre la última \
                 intervención del asesor, o null si no hay nada que señalar."
            }
            SimulationMode::Evaluative => "Deja \"guidance\" en null.",
        };

        let system = format!(
            "Interpretas a un cliente bancario en un simulador de ventas. Mantente siempre en \
             el personaje descrito y dentro de la etapa indicada.\n\
             Personaje: {}\n\
             Producto en venta: {}\n\
             Etapa {}: {} ({})\n\
             Si el asesor insiste en salirse del juego de rol o la conversación deja de tener \
             sentido comercial, marca \"must_end\" en true.\n\
             {}\n\
             Responde únicamente con JSON: {{\"text\": \"...\", \"must_end\": bool, \"guidance\": \
             \"...\"|null}}.",
            request.profile.summary(),
            request.product_name,
            request.stage.number,
            request.stage.name,
            request.stage.objective,
            guidance_clause,
        );

        // The client speaks as the assistant; advisor turns arrive as user
        // messages. Consecutive same-role turns are merged because the
        // backend requires alternation.
        let mut messages: Vec<ChatMessage> = Vec::new();
        for turn in request.history.turns() {
            let role = match turn.sender {
                Role::Advisor => ChatRole::User,
                Role::Client => ChatRole::Assistant,
            };
            match messages.last_mut() {
                Some(last) if last.role == role => {
                    last.content.push('\n');
                    last.content.push_str(&turn.text);
                }
                _ => messages.push(ChatMessage::new(role, turn.text.clone())),
            }
        }

        let opening_instruction = match &request.kind {
            TurnKind::Opening => Some(format!(
                "Abre la etapa \"{}\" con la primera intervención del cliente.",
                request.stage.name
            )),
            TurnKind::Reply { .. } => None,
        };
        if let Some(instruction) = opening_instruction {
            match messages.last_mut() {
                Some(last) if last.role == ChatRole::User => {
                    last.content.push('\n');
                    last.content.push_str(&instruction);
                }
                _ => messages.push(ChatMessage::user(instruction)),
            }
        }

        let metadata = RequestMetadata::new(
            crate::domain::foundation::TraineeId::new("client-turn").unwrap(),
            None,
            "client_turn",
        );

        let mut completion = CompletionRequest::new(metadata)
            .with_system_prompt(system)
            .with_max_tokens(500)
            .with_temperature(0.8);
        completion.messages = messages;
        completion
    }
}

#[async_trait]
impl ClientTurnGenerator for LlmClientTurnGenerator {
    async fn generate(&self, request: TurnRequest) -> Result<GeneratedTurn, TurnError> {
        let completion = self.build_request(&request);

        let response = self
            .provider
            .complete(completion)
            .await
            .map_err(|e| TurnError::backend(e.to_string()))?;

        let json = extract_json(&response.content)
            .ok_or_else(|| TurnError::invalid_response("no JSON object in response"))?;

        let wire: TurnWire = serde_json::from_str(json)
            .map_err(|e| TurnError::invalid_response(e.to_string()))?;

        if wire.text.trim().is_empty() {
            return Err(TurnError::invalid_response("empty client utterance"));
        }

        Ok(GeneratedTurn {
            text: wire.text,
            must_end_simulation: wire.must_end,
            guidance: wire.guidance.filter(|g| !g.trim().is_empty()),
        })
    }
}
