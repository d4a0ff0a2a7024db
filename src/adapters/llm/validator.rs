//! LLM implementation of the ContextValidator port.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use crate::domain::simulation::Role;
use crate::ports::{
    AiProvider, ChatRole, CompletionRequest, ContextValidator, ContextVerdict, RequestMetadata,
    ValidationRequest,
};

use super::extract_json;

/// Product policy: a backend failure must never end a trainee's session.
///
/// False negatives (wrongly terminating a session) cost more than false
/// positives (letting a borderline message through), so on any backend or
/// parse failure the adapter accepts the message and records why.
const FAIL_OPEN_ON_BACKEND_ERROR: bool = true;

/// Screens advisor messages against the sales context via the backend.
pub struct LlmContextValidator {
    provider: Arc<dyn AiProvider>,
}

#[derive(Debug, Deserialize)]
struct VerdictWire {
    in_context: bool,
    #[serde(default)]
    reason: String,
}

impl LlmContextValidator {
    pub fn new(provider: Arc<dyn AiProvider>) -> Self {
        Self { provider }
    }

    fn build_request(&self, request: &ValidationRequest) -> CompletionRequest {
        let system = "Eres el supervisor de un simulador de ventas bancarias. Evalúas si el \
                      mensaje del asesor en formación es apropiado y pertinente a la venta en curso. \
                      Rechaza mensajes ofensivos, fuera de tema o que rompan el juego de rol. \
                      Responde únicamente con JSON: {\"in_context\": bool, \"reason\": \"...\"}.";

        let transcript = request
            .history
            .turns()
            .iter()
            .map(|t| {
                let who = match t.sender {
                    Role::Advisor => "Asesor",
                    Role::Client => "Cliente",
                };
                format!("{}: {}", who, t.text)
            })
            .collect::<Vec<_>>()
            .join("\n");

        let instruction = format!(
            "Producto: {}\nEtapa {} de {}: {} ({})\nCliente: {}\n\nConversación:\n{}\n\n\
             Mensaje del asesor a evaluar:\n{}",
            request.product_name,
            request.stage.number,
            request.history.last().map(|t| t.total_stages).unwrap_or(0),
            request.stage.name,
            request.stage.objective,
            request.profile.summary(),
            transcript,
            request.advisor_message,
        );

        let metadata = RequestMetadata::new(
            crate::domain::foundation::TraineeId::new("validator").unwrap(),
            None,
            "context_validation",
        );

        CompletionRequest::new(metadata)
            .with_system_prompt(system)
            .with_message(ChatRole::User, instruction)
            .with_max_tokens(200)
            .with_temperature(0.0)
    }

    fn on_backend_failure(reason: String) -> ContextVerdict {
        if FAIL_OPEN_ON_BACKEND_ERROR {
            tracing::warn!(reason = %reason, "context validation unavailable, failing open");
            ContextVerdict::accepted(format!("validation unavailable: {}", reason))
        } else {
            ContextVerdict::rejected(format!("validation unavailable: {}", reason))
        }
    }
}

#[async_trait]
impl ContextValidator for LlmContextValidator {
    async fn validate(&self, request: ValidationRequest) -> ContextVerdict {
        let completion = self.build_request(&request);

        let response = match self.provider.complete(completion).await {
            Ok(response) => response,
            Err(e) => return Self::on_backend_failure(e.to_string()),
        };

        let Some(json) = extract_json(&response.content) else {
            return Self::on_backend_failure("no JSON object in response".to_string());
        };

        match serde_json::from_str::<VerdictWire>(json) {
            Ok(wire) => ContextVerdict {
                in_context: wire.in_context,
                reason: wire.reason,
            },
            Err(e) => Self::on_backend_failure(e.to_string()),
        }
    }
}
