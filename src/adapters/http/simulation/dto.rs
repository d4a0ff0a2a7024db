//! HTTP DTOs for the simulation endpoints.
//!
//! Field names keep the original Spanish wire contract; values that machines
//! branch on (estado, motivo_finalizacion, emisor) stay as stable English
//! snake_case strings.

use serde::{Deserialize, Serialize};

use crate::domain::catalog::Stage;
use crate::domain::simulation::{
    ClientProfile, FinishReason, Gender, KnowledgeLevel, LearningNote, Lifecycle, RiskProfile,
    Role, Turn,
};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to start a simulation.
#[derive(Debug, Clone, Deserialize)]
pub struct IniciarSimulacionRequest {
    pub usuario_id: String,
    pub producto: String,
    #[serde(default = "default_modo")]
    pub modo: String,
}

fn default_modo() -> String {
    "learning".to_string()
}

/// Request to submit an advisor message.
#[derive(Debug, Clone, Deserialize)]
pub struct EnviarMensajeRequest {
    pub mensaje: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// Shared DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Stage descriptor on the wire.
#[derive(Debug, Clone, Serialize)]
pub struct EtapaDto {
    pub numero: u32,
    pub total_etapas: u32,
    pub nombre: String,
    pub objetivo: String,
    pub inicia: &'static str,
}

impl EtapaDto {
    pub fn from_stage(stage: &Stage, total_etapas: u32) -> Self {
        Self {
            numero: stage.number,
            total_etapas,
            nombre: stage.name.clone(),
            objetivo: stage.objective.clone(),
            inicia: match stage.initiator {
                crate::domain::catalog::InitiatingRole::Advisor => "advisor",
                crate::domain::catalog::InitiatingRole::Client => "client",
            },
        }
    }
}

/// One history entry on the wire.
#[derive(Debug, Clone, Serialize)]
pub struct MensajeDto {
    pub id: String,
    pub etapa: u32,
    pub emisor: &'static str,
    pub texto: String,
    pub enviado_en: chrono::DateTime<chrono::Utc>,
}

impl From<&Turn> for MensajeDto {
    fn from(turn: &Turn) -> Self {
        Self {
            id: turn.id.to_string(),
            etapa: turn.stage_number,
            emisor: match turn.sender {
                Role::Advisor => "advisor",
                Role::Client => "client",
            },
            texto: turn.text.clone(),
            enviado_en: *turn.sent_at.as_datetime(),
        }
    }
}

/// Client persona summary on the wire.
#[derive(Debug, Clone, Serialize)]
pub struct PerfilDto {
    pub nombre: String,
    pub edad: u8,
    pub ocupacion: String,
    pub situacion_actual: String,
    pub motivacion: String,
    pub nivel_conocimiento: &'static str,
    pub perfil_riesgo: &'static str,
    pub meta_financiera: String,
    pub contexto: String,
    pub genero: &'static str,
}

impl From<&ClientProfile> for PerfilDto {
    fn from(profile: &ClientProfile) -> Self {
        Self {
            nombre: profile.name.clone(),
            edad: profile.age,
            ocupacion: profile.occupation.clone(),
            situacion_actual: profile.current_situation.clone(),
            motivacion: profile.motivation.clone(),
            nivel_conocimiento: match profile.knowledge_level {
                KnowledgeLevel::Basic => "basic",
                KnowledgeLevel::Intermediate => "intermediate",
                KnowledgeLevel::Advanced => "advanced",
            },
            perfil_riesgo: match profile.risk_profile {
                RiskProfile::Conservative => "conservative",
                RiskProfile::Moderate => "moderate",
                RiskProfile::Aggressive => "aggressive",
            },
            meta_financiera: profile.financial_goal.clone(),
            contexto: profile.background.clone(),
            genero: match profile.gender {
                Gender::Female => "female",
                Gender::Male => "male",
            },
        }
    }
}

/// Coaching note on the wire.
#[derive(Debug, Clone, Serialize)]
pub struct AnotacionDto {
    pub etapa: u32,
    pub texto: String,
}

impl From<&LearningNote> for AnotacionDto {
    fn from(note: &LearningNote) -> Self {
        Self {
            etapa: note.stage_number,
            texto: note.text.clone(),
        }
    }
}

pub fn estado_str(lifecycle: Lifecycle) -> &'static str {
    lifecycle.as_str()
}

pub fn motivo_str(reason: Option<FinishReason>) -> Option<&'static str> {
    reason.map(|r| r.as_str())
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Response for a started simulation.
#[derive(Debug, Clone, Serialize)]
pub struct SimulacionIniciadaResponse {
    pub ok: bool,
    pub estado: &'static str,
    pub simulacion_id: String,
    pub producto: String,
    pub modo: &'static str,
    pub etapa: EtapaDto,
    pub perfil_cliente: PerfilDto,
    pub mensaje_inicial: Option<MensajeDto>,
}

/// Response for a submitted message.
#[derive(Debug, Clone, Serialize)]
pub struct MensajeEnviadoResponse {
    pub ok: bool,
    pub estado: &'static str,
    pub mensaje_asesor: MensajeDto,
    pub mensaje_cliente: MensajeDto,
    pub etapa_cambiada: bool,
    pub etapa_actual: EtapaDto,
    pub mensaje_apertura: Option<MensajeDto>,
    pub simulacion_finalizada: bool,
    pub motivo_finalizacion: Option<&'static str>,
    pub intercambios: Option<u32>,
    pub minimo_requerido: Option<u32>,
}

/// Response for the state snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct EstadoSimulacionResponse {
    pub ok: bool,
    pub estado: &'static str,
    pub simulacion_id: String,
    pub producto: String,
    pub modo: &'static str,
    pub etapa_actual: EtapaDto,
    pub perfil_cliente: PerfilDto,
    pub historial: Vec<MensajeDto>,
    pub anotaciones: Vec<AnotacionDto>,
    pub duracion_segundos: i64,
}

/// Response for pause/resume.
#[derive(Debug, Clone, Serialize)]
pub struct CambioEstadoResponse {
    pub ok: bool,
    pub estado: &'static str,
    pub simulacion_id: String,
}

/// Response for manual finalization.
#[derive(Debug, Clone, Serialize)]
pub struct SimulacionFinalizadaResponse {
    pub ok: bool,
    pub estado: &'static str,
    pub motivo_finalizacion: &'static str,
    pub etapa_alcanzada: u32,
    pub total_etapas: u32,
    pub total_mensajes: usize,
    pub duracion_segundos: i64,
    pub historial: Vec<MensajeDto>,
}

/// Standard error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub codigo: String,
    pub mensaje: String,
}

impl ErrorResponse {
    pub fn new(codigo: impl Into<String>, mensaje: impl Into<String>) -> Self {
        Self {
            ok: false,
            codigo: codigo.into(),
            mensaje: mensaje.into(),
        }
    }

    pub fn bad_request(mensaje: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", mensaje)
    }

    pub fn internal(mensaje: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", mensaje)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{self, InitiatingRole};

    #[test]
    fn iniciar_request_defaults_to_learning_mode() {
        let json = r#"{"usuario_id":"t1","producto":"cuenta-ahorros"}"#;
        let req: IniciarSimulacionRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.modo, "learning");
    }

    #[test]
    fn etapa_dto_carries_initiator() {
        let product = catalog::resolve("cuenta-ahorros").unwrap();
        let stage = product.stage(4).unwrap();
        assert_eq!(stage.initiator, InitiatingRole::Client);

        let dto = EtapaDto::from_stage(stage, product.total_stages());
        assert_eq!(dto.numero, 4);
        assert_eq!(dto.total_etapas, 7);
        assert_eq!(dto.inicia, "client");
    }

    #[test]
    fn error_response_serializes_with_ok_false() {
        let error = ErrorResponse::new("EMPTY_MESSAGE", "Message cannot be empty");
        let json = serde_json::to_string(&error).unwrap();

        assert!(json.contains("\"ok\":false"));
        assert!(json.contains("EMPTY_MESSAGE"));
    }
}
