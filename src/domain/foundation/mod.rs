//! Foundation value objects shared across the domain.

mod errors;
mod ids;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{MessageId, SimulationId, TraineeId};
pub use timestamp::Timestamp;
