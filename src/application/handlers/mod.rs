//! Application command/query handlers, one per engine operation.

mod finalize_simulation;
mod get_state;
mod pause_simulation;
mod resume_simulation;
mod start_simulation;
mod submit_message;

pub use finalize_simulation::{
    FinalizeSimulationCommand, FinalizeSimulationError, FinalizeSimulationHandler,
    FinalizeSimulationResult,
};
pub use get_state::{GetStateError, GetStateHandler, GetStateQuery, GetStateResult};
pub use pause_simulation::{
    PauseSimulationCommand, PauseSimulationError, PauseSimulationHandler, PauseSimulationResult,
};
pub use resume_simulation::{
    ResumeSimulationCommand, ResumeSimulationError, ResumeSimulationHandler,
    ResumeSimulationResult,
};
pub use start_simulation::{
    StartSimulationCommand, StartSimulationError, StartSimulationHandler, StartSimulationResult,
};
pub use submit_message::{
    SubmitMessageCommand, SubmitMessageError, SubmitMessageHandler, SubmitMessageResult,
};
