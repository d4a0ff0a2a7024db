//! Stage progression policy.
//!
//! Pure and deterministic: whether a stage is complete depends only on the
//! stage descriptor and the turns tagged with its order number.

use serde::{Deserialize, Serialize};

use crate::domain::catalog::Stage;

use super::history::ConversationHistory;

/// Outcome of evaluating the progression policy for one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageProgress {
    pub must_advance: bool,
    pub exchange_count: u32,
    pub minimum_required: u32,
}

/// Evaluates whether the given stage has collected enough turns to advance.
///
/// Counts history entries tagged with the stage's order number against the
/// stage minimum: 2 for advisor-initiated stages, 3 for client-initiated ones
/// (the opening line is already on the record before the advisor speaks).
pub fn evaluate(stage: &Stage, history: &ConversationHistory) -> StageProgress {
    let exchange_count = history.exchanges_in_stage(stage.number);
    let minimum_required = stage.minimum_exchanges();
    StageProgress {
        must_advance: exchange_count >= minimum_required,
        exchange_count,
        minimum_required,
    }
}
