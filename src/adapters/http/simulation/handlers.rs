//! HTTP handlers for the simulation endpoints.
//!
//! These handlers connect Axum routes to the application layer. Mutating
//! operations run on a spawned task so an aborted client connection cannot
//! abandon a half-applied turn.

use std::sync::Arc;

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::handlers::{
    FinalizeSimulationCommand, FinalizeSimulationError, FinalizeSimulationHandler,
    GetStateHandler, GetStateQuery, PauseSimulationCommand, PauseSimulationError,
    PauseSimulationHandler, ResumeSimulationCommand, ResumeSimulationError,
    ResumeSimulationHandler, StartSimulationCommand, StartSimulationError,
    StartSimulationHandler, SubmitMessageCommand, SubmitMessageError, SubmitMessageHandler,
};
use crate::application::handlers::GetStateError;
use crate::domain::foundation::TraineeId;
use crate::domain::simulation::SimulationMode;
use crate::ports::{
    ClientTurnGenerator, ContextValidator, PerformanceAnalyzer, ScenarioGenerator,
    SimulationStore,
};

use super::dto::{
    estado_str, motivo_str, AnotacionDto, CambioEstadoResponse, EnviarMensajeRequest,
    ErrorResponse, EstadoSimulacionResponse, EtapaDto, IniciarSimulacionRequest,
    MensajeDto, MensajeEnviadoResponse, SimulacionFinalizadaResponse,
    SimulacionIniciadaResponse,
};

type ApiError = (StatusCode, Json<ErrorResponse>);

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all engine dependencies.
#[derive(Clone)]
pub struct SimulationAppState {
    pub store: Arc<dyn SimulationStore>,
    pub scenarios: Arc<dyn ScenarioGenerator>,
    pub validator: Arc<dyn ContextValidator>,
    pub turns: Arc<dyn ClientTurnGenerator>,
    pub analyzer: Arc<dyn PerformanceAnalyzer>,
}

impl SimulationAppState {
    pub fn new(
        store: Arc<dyn SimulationStore>,
        scenarios: Arc<dyn ScenarioGenerator>,
        validator: Arc<dyn ContextValidator>,
        turns: Arc<dyn ClientTurnGenerator>,
        analyzer: Arc<dyn PerformanceAnalyzer>,
    ) -> Self {
        Self {
            store,
            scenarios,
            validator,
            turns,
            analyzer,
        }
    }

    pub fn start_simulation_handler(&self) -> StartSimulationHandler {
        StartSimulationHandler::new(
            self.store.clone(),
            self.scenarios.clone(),
            self.turns.clone(),
        )
    }

    pub fn submit_message_handler(&self) -> SubmitMessageHandler {
        SubmitMessageHandler::new(
            self.store.clone(),
            self.validator.clone(),
            self.turns.clone(),
            self.analyzer.clone(),
        )
    }

    pub fn get_state_handler(&self) -> GetStateHandler {
        GetStateHandler::new(self.store.clone())
    }

    pub fn pause_simulation_handler(&self) -> PauseSimulationHandler {
        PauseSimulationHandler::new(self.store.clone())
    }

    pub fn resume_simulation_handler(&self) -> ResumeSimulationHandler {
        ResumeSimulationHandler::new(self.store.clone())
    }

    pub fn finalize_simulation_handler(&self) -> FinalizeSimulationHandler {
        FinalizeSimulationHandler::new(self.store.clone())
    }
}

fn parse_trainee(raw: &str) -> Result<TraineeId, ApiError> {
    TraineeId::new(raw).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::bad_request("usuario_id cannot be blank")),
        )
    })
}

fn join_error(e: tokio::task::JoinError) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::internal(format!("task failure: {}", e))),
    )
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// Start a simulation
///
/// POST /simulaciones
pub async fn iniciar_simulacion(
    State(app_state): State<SimulationAppState>,
    Json(req): Json<IniciarSimulacionRequest>,
) -> Result<impl IntoResponse, impl IntoResponse> {
    let trainee_id = parse_trainee(&req.usuario_id)?;

    let mode = SimulationMode::parse(&req.modo).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::bad_request(
                "modo must be 'learning' or 'evaluative'",
            )),
        )
    })?;

    let cmd = StartSimulationCommand {
        trainee_id,
        product: req.producto,
        mode,
    };

    let handler = app_state.start_simulation_handler();
    let result = tokio::spawn(async move { handler.handle(cmd).await })
        .await
        .map_err(join_error)?
        .map_err(|e| match e {
            StartSimulationError::DuplicateActive(_) => (
                StatusCode::CONFLICT,
                Json(ErrorResponse::new("DUPLICATE_ACTIVE_SIMULATION", e.to_string())),
            ),
            StartSimulationError::UnknownProduct(_) => (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new("UNKNOWN_PRODUCT", e.to_string())),
            ),
            StartSimulationError::Generation(msg) => (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse::new("GENERATION_FAILURE", msg)),
            ),
            StartSimulationError::Storage(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::internal(msg)),
            ),
            StartSimulationError::Domain(err) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::bad_request(err.to_string())),
            ),
        })?;

    let simulation = &result.simulation;
    let response = SimulacionIniciadaResponse {
        ok: true,
        estado: estado_str(simulation.lifecycle),
        simulacion_id: simulation.id.to_string(),
        producto: simulation.product_slug.clone(),
        modo: simulation.mode.as_str(),
        etapa: EtapaDto::from_stage(&result.first_stage, simulation.total_stages),
        perfil_cliente: (&simulation.profile).into(),
        mensaje_inicial: result.opening_message.as_ref().map(MensajeDto::from),
    };

    Ok::<_, ApiError>((StatusCode::CREATED, Json(response)))
}

/// Submit an advisor message
///
/// POST /simulaciones/{usuario_id}/mensajes
pub async fn enviar_mensaje(
    State(app_state): State<SimulationAppState>,
    Path(usuario_id): Path<String>,
    Json(req): Json<EnviarMensajeRequest>,
) -> Result<impl IntoResponse, impl IntoResponse> {
    let trainee_id = parse_trainee(&usuario_id)?;

    let cmd = SubmitMessageCommand {
        trainee_id,
        message: req.mensaje,
    };

    let handler = app_state.submit_message_handler();
    let result = tokio::spawn(async move { handler.handle(cmd).await })
        .await
        .map_err(join_error)?
        .map_err(|e| match e {
            SubmitMessageError::NoActiveSimulation(_) => (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new("NO_ACTIVE_SIMULATION", e.to_string())),
            ),
            SubmitMessageError::EmptyMessage => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("EMPTY_MESSAGE", e.to_string())),
            ),
            SubmitMessageError::Generation(msg) => (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse::new("GENERATION_FAILURE", msg)),
            ),
            SubmitMessageError::Conflict(_) => (
                StatusCode::CONFLICT,
                Json(ErrorResponse::new("CONCURRENT_MODIFICATION", e.to_string())),
            ),
            SubmitMessageError::Storage(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::internal(msg)),
            ),
            SubmitMessageError::Domain(err) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::bad_request(err.to_string())),
            ),
        })?;

    let response = MensajeEnviadoResponse {
        ok: true,
        estado: estado_str(result.simulation.lifecycle),
        mensaje_asesor: (&result.advisor_turn).into(),
        mensaje_cliente: (&result.client_turn).into(),
        etapa_cambiada: result.stage_changed,
        etapa_actual: EtapaDto::from_stage(&result.current_stage, result.simulation.total_stages),
        mensaje_apertura: result.opening_message.as_ref().map(MensajeDto::from),
        simulacion_finalizada: result.finished,
        motivo_finalizacion: motivo_str(result.finish_reason),
        intercambios: result.progress.map(|p| p.exchange_count),
        minimo_requerido: result.progress.map(|p| p.minimum_required),
    };

    Ok::<_, ApiError>((StatusCode::OK, Json(response)))
}

/// Get the simulation state snapshot
///
/// GET /simulaciones/{usuario_id}
pub async fn estado_simulacion(
    State(app_state): State<SimulationAppState>,
    Path(usuario_id): Path<String>,
) -> Result<impl IntoResponse, impl IntoResponse> {
    let trainee_id = parse_trainee(&usuario_id)?;

    let handler = app_state.get_state_handler();
    let result = handler
        .handle(GetStateQuery { trainee_id })
        .await
        .map_err(|e| match e {
            GetStateError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new("NOT_FOUND", e.to_string())),
            ),
            GetStateError::Storage(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::internal(msg)),
            ),
            GetStateError::Domain(err) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::bad_request(err.to_string())),
            ),
        })?;

    let simulation = &result.simulation;
    let response = EstadoSimulacionResponse {
        ok: true,
        estado: estado_str(simulation.lifecycle),
        simulacion_id: simulation.id.to_string(),
        producto: simulation.product_slug.clone(),
        modo: simulation.mode.as_str(),
        etapa_actual: EtapaDto::from_stage(&result.current_stage, simulation.total_stages),
        perfil_cliente: (&simulation.profile).into(),
        historial: simulation.history.turns().iter().map(MensajeDto::from).collect(),
        anotaciones: simulation.notes.iter().map(AnotacionDto::from).collect(),
        duracion_segundos: simulation.duration_secs(),
    };

    Ok::<_, ApiError>((StatusCode::OK, Json(response)))
}

/// Pause the simulation
///
/// POST /simulaciones/{usuario_id}/pausa
pub async fn pausar_simulacion(
    State(app_state): State<SimulationAppState>,
    Path(usuario_id): Path<String>,
) -> Result<impl IntoResponse, impl IntoResponse> {
    let trainee_id = parse_trainee(&usuario_id)?;

    let handler = app_state.pause_simulation_handler();
    let cmd = PauseSimulationCommand { trainee_id };
    let result = tokio::spawn(async move { handler.handle(cmd).await })
        .await
        .map_err(join_error)?
        .map_err(|e| match e {
            PauseSimulationError::NoActiveSimulation(_) => (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new("NO_ACTIVE_SIMULATION", e.to_string())),
            ),
            PauseSimulationError::Conflict(_) => (
                StatusCode::CONFLICT,
                Json(ErrorResponse::new("CONCURRENT_MODIFICATION", e.to_string())),
            ),
            PauseSimulationError::Storage(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::internal(msg)),
            ),
            PauseSimulationError::Domain(err) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::bad_request(err.to_string())),
            ),
        })?;

    let response = CambioEstadoResponse {
        ok: true,
        estado: estado_str(result.simulation.lifecycle),
        simulacion_id: result.simulation.id.to_string(),
    };

    Ok::<_, ApiError>((StatusCode::OK, Json(response)))
}

/// Resume the simulation
///
/// POST /simulaciones/{usuario_id}/reanudacion
pub async fn reanudar_simulacion(
    State(app_state): State<SimulationAppState>,
    Path(usuario_id): Path<String>,
) -> Result<impl IntoResponse, impl IntoResponse> {
    let trainee_id = parse_trainee(&usuario_id)?;

    let handler = app_state.resume_simulation_handler();
    let cmd = ResumeSimulationCommand { trainee_id };
    let result = tokio::spawn(async move { handler.handle(cmd).await })
        .await
        .map_err(join_error)?
        .map_err(|e| match e {
            ResumeSimulationError::NoActiveSimulation(_) => (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new("NO_ACTIVE_SIMULATION", e.to_string())),
            ),
            ResumeSimulationError::Conflict(_) => (
                StatusCode::CONFLICT,
                Json(ErrorResponse::new("CONCURRENT_MODIFICATION", e.to_string())),
            ),
            ResumeSimulationError::Storage(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::internal(msg)),
            ),
            ResumeSimulationError::Domain(err) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::bad_request(err.to_string())),
            ),
        })?;

    let response = CambioEstadoResponse {
        ok: true,
        estado: estado_str(result.simulation.lifecycle),
        simulacion_id: result.simulation.id.to_string(),
    };

    Ok::<_, ApiError>((StatusCode::OK, Json(response)))
}

/// Finalize the simulation manually
///
/// POST /simulaciones/{usuario_id}/finalizacion
pub async fn finalizar_simulacion(
    State(app_state): State<SimulationAppState>,
    Path(usuario_id): Path<String>,
) -> Result<impl IntoResponse, impl IntoResponse> {
    let trainee_id = parse_trainee(&usuario_id)?;

    let handler = app_state.finalize_simulation_handler();
    let cmd = FinalizeSimulationCommand { trainee_id };
    let result = tokio::spawn(async move { handler.handle(cmd).await })
        .await
        .map_err(join_error)?
        .map_err(|e| match e {
            FinalizeSimulationError::NoActiveSimulation(_) => (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new("NO_ACTIVE_SIMULATION", e.to_string())),
            ),
            FinalizeSimulationError::Conflict(_) => (
                StatusCode::CONFLICT,
                Json(ErrorResponse::new("CONCURRENT_MODIFICATION", e.to_string())),
            ),
            FinalizeSimulationError::Storage(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::internal(msg)),
            ),
            FinalizeSimulationError::Domain(err) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::bad_request(err.to_string())),
            ),
        })?;

    let response = SimulacionFinalizadaResponse {
        ok: true,
        estado: estado_str(result.simulation.lifecycle),
        motivo_finalizacion: result
            .simulation
            .finish_reason
            .map(|r| r.as_str())
            .unwrap_or("manual"),
        etapa_alcanzada: result.stage_reached,
        total_etapas: result.total_stages,
        total_mensajes: result.message_count,
        duracion_segundos: result.duration_secs,
        historial: result.history.turns().iter().map(MensajeDto::from).collect(),
    };

    Ok::<_, ApiError>((StatusCode::OK, Json(response)))
}
