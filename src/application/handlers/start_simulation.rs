//! StartSimulationHandler - create a trainee's simulation and its scenario.

use rand::seq::SliceRandom;
use std::sync::Arc;

use crate::domain::catalog::{self, ClientType, Segment, Stage};
use crate::domain::foundation::{DomainError, TraineeId};
use crate::domain::simulation::{Simulation, SimulationMode, Role, Turn};
use crate::ports::{
    ClientTurnGenerator, ScenarioError, ScenarioGenerator, ScenarioRequest, SimulationStore,
    StoreError, TurnError, TurnKind, TurnRequest,
};

/// Command to start a simulation.
#[derive(Debug, Clone)]
pub struct StartSimulationCommand {
    pub trainee_id: TraineeId,
    pub product: String,
    pub mode: SimulationMode,
}

/// Result of starting a simulation.
#[derive(Debug, Clone)]
pub struct StartSimulationResult {
    pub simulation: Simulation,
    pub first_stage: Stage,
    /// Present only when the first stage is client-initiated.
    pub opening_message: Option<Turn>,
}

/// Error type for starting simulations.
#[derive(Debug)]
pub enum StartSimulationError {
    /// Trainee already has a non-terminal simulation.
    DuplicateActive(TraineeId),
    /// Product choice did not resolve against the catalog.
    UnknownProduct(String),
    /// Scenario or opening-line generation failed; nothing was persisted.
    Generation(String),
    /// Storage error.
    Storage(String),
    /// Domain error.
    Domain(DomainError),
}

impl std::fmt::Display for StartSimulationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StartSimulationError::DuplicateActive(id) => {
                write!(f, "Trainee {} already has an active simulation", id)
            }
            StartSimulationError::UnknownProduct(p) => write!(f, "Unknown product: {}", p),
            StartSimulationError::Generation(err) => write!(f, "Generation failure: {}", err),
            StartSimulationError::Storage(err) => write!(f, "Storage error: {}", err),
            StartSimulationError::Domain(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for StartSimulationError {}

impl From<DomainError> for StartSimulationError {
    fn from(err: DomainError) -> Self {
        StartSimulationError::Domain(err)
    }
}

impl From<StoreError> for StartSimulationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateActive(id) => StartSimulationError::DuplicateActive(id),
            other => StartSimulationError::Storage(other.to_string()),
        }
    }
}

impl From<ScenarioError> for StartSimulationError {
    fn from(err: ScenarioError) -> Self {
        StartSimulationError::Generation(err.to_string())
    }
}

impl From<TurnError> for StartSimulationError {
    fn from(err: TurnError) -> Self {
        StartSimulationError::Generation(err.to_string())
    }
}

/// Handler for starting simulations.
pub struct StartSimulationHandler {
    store: Arc<dyn SimulationStore>,
    scenarios: Arc<dyn ScenarioGenerator>,
    turns: Arc<dyn ClientTurnGenerator>,
}

impl StartSimulationHandler {
    pub fn new(
        store: Arc<dyn SimulationStore>,
        scenarios: Arc<dyn ScenarioGenerator>,
        turns: Arc<dyn ClientTurnGenerator>,
    ) -> Self {
        Self {
            store,
            scenarios,
            turns,
        }
    }

    pub async fn handle(
        &self,
        cmd: StartSimulationCommand,
    ) -> Result<StartSimulationResult, StartSimulationError> {
        // 1. Uniqueness: one non-terminal simulation per trainee
        if let Some(existing) = self.store.find_active(&cmd.trainee_id).await? {
            tracing::debug!(
                trainee_id = %cmd.trainee_id,
                simulation_id = %existing.id,
                "start rejected, simulation already active"
            );
            return Err(StartSimulationError::DuplicateActive(cmd.trainee_id));
        }

        // 2. Resolve the product
        let product = catalog::resolve(&cmd.product)
            .ok_or_else(|| StartSimulationError::UnknownProduct(cmd.product.clone()))?;

        // 3. Draw a client archetype and a compatible segment
        let (client_type, segment) = draw_scenario_inputs(product.compatible_segments.as_slice());

        // 4. Generate the client persona
        let profile = self
            .scenarios
            .generate(ScenarioRequest {
                product_name: product.name.clone(),
                client_type,
                segment,
                mode: cmd.mode,
            })
            .await?;

        // 5. Create the simulation at stage 1
        let mut simulation = Simulation::new(cmd.trainee_id, product, cmd.mode, profile);
        let first_stage = product.first_stage().clone();

        // 6. Client-initiated first stage opens before the trainee sees anything
        let opening_message = if first_stage.is_client_initiated() {
            let opener = self
                .turns
                .generate(TurnRequest {
                    product_name: product.name.clone(),
                    profile: simulation.profile.clone(),
                    stage: first_stage.clone(),
                    history: simulation.history.clone(),
                    mode: simulation.mode,
                    kind: TurnKind::Opening,
                })
                .await?;
            Some(simulation.record_turn(&first_stage, Role::Client, opener.text))
        } else {
            None
        };

        // 7. Persist
        self.store.create(&simulation).await?;

        tracing::info!(
            trainee_id = %simulation.trainee_id,
            simulation_id = %simulation.id,
            product = %simulation.product_slug,
            mode = simulation.mode.as_str(),
            "simulation started"
        );

        Ok(StartSimulationResult {
            simulation,
            first_stage,
            opening_message,
        })
    }
}

fn draw_scenario_inputs(compatible_segments: &[Segment]) -> (ClientType, Segment) {
    let mut rng = rand::thread_rng();
    let client_type = *ClientType::all()
        .choose(&mut rng)
        .expect("client archetype list is never empty");
    let segment = *compatible_segments
        .choose(&mut rng)
        .expect("catalog products always carry compatible segments");
    (client_type, segment)
}
