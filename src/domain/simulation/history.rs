//! Conversation history: an append-only ordered log of turns.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::catalog::Stage;
use crate::domain::foundation::{MessageId, Timestamp};

/// Who sent a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Advisor,
    Client,
}

impl Role {
    /// The implicit receiver of a turn sent by this role.
    pub fn counterpart(&self) -> Role {
        match self {
            Role::Advisor => Role::Client,
            Role::Client => Role::Advisor,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Advisor => "advisor",
            Role::Client => "client",
        };
        write!(f, "{}", s)
    }
}

/// One entry in the conversation history.
///
/// Stage name, objective and total are denormalized so a finished
/// simulation can be audited without the catalog at hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub id: MessageId,
    pub stage_number: u32,
    pub total_stages: u32,
    pub stage_name: String,
    pub stage_objective: String,
    pub sender: Role,
    pub text: String,
    pub sent_at: Timestamp,
}

/// Append-only ordered log of turns.
///
/// Turns can only be added through [`ConversationHistory::record`]; there is
/// deliberately no API to edit or remove an entry once written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationHistory {
    turns: Vec<Turn>,
}

impl ConversationHistory {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self { turns: Vec::new() }
    }

    /// Appends a turn for the given stage and returns it.
    pub fn record(
        &mut self,
        stage: &Stage,
        total_stages: u32,
        sender: Role,
        text: impl Into<String>,
    ) -> &Turn {
        let turn = Turn {
            id: MessageId::new(),
            stage_number: stage.number,
            total_stages,
            stage_name: stage.name.clone(),
            stage_objective: stage.objective.clone(),
            sender,
            text: text.into(),
            sent_at: Timestamp::now(),
        };
        self.turns.push(turn);
        self.turns.last().unwrap()
    }

    /// All turns in the order they were recorded.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Number of turns tagged with the given stage order number.
    pub fn exchanges_in_stage(&self, stage_number: u32) -> u32 {
        self.turns
            .iter()
            .filter(|t| t.stage_number == stage_number)
            .count() as u32
    }

    /// Total number of turns recorded.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// True if no turn has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The most recent turn, if any.
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{InitiatingRole, Stage};

    fn test_stage(number: u32) -> Stage {
        Stage::new(number, "Saludo", "Abrir la conversación", InitiatingRole::Advisor)
    }

    #[test]
    fn record_appends_in_order() {
        let mut history = ConversationHistory::new();
        let stage = test_stage(1);

        history.record(&stage, 7, Role::Advisor, "Buenos días");
        history.record(&stage, 7, Role::Client, "Buenos días, gracias");

        assert_eq!(history.len(), 2);
        assert_eq!(history.turns()[0].sender, Role::Advisor);
        assert_eq!(history.turns()[1].sender, Role::Client);
        assert_eq!(history.last().unwrap().text, "Buenos días, gracias");
    }

    #[test]
    fn record_denormalizes_stage_fields() {
        let mut history = ConversationHistory::new();
        let stage = test_stage(3);

        let turn = history.record(&stage, 7, Role::Advisor, "hola");
        assert_eq!(turn.stage_number, 3);
        assert_eq!(turn.total_stages, 7);
        assert_eq!(turn.stage_name, "Saludo");
        assert_eq!(turn.stage_objective, "Abrir la conversación");
    }

    #[test]
    fn exchanges_in_stage_counts_only_matching_turns() {
        let mut history = ConversationHistory::new();
        let first = test_stage(1);
        let second = test_stage(2);

        history.record(&first, 7, Role::Advisor, "a");
        history.record(&first, 7, Role::Client, "b");
        history.record(&second, 7, Role::Advisor, "c");

        assert_eq!(history.exchanges_in_stage(1), 2);
        assert_eq!(history.exchanges_in_stage(2), 1);
        assert_eq!(history.exchanges_in_stage(3), 0);
    }

    #[test]
    fn counterpart_is_the_other_role() {
        assert_eq!(Role::Advisor.counterpart(), Role::Client);
        assert_eq!(Role::Client.counterpart(), Role::Advisor);
    }

    #[test]
    fn serializes_as_plain_array() {
        let mut history = ConversationHistory::new();
        history.record(&test_stage(1), 7, Role::Advisor, "hola");

        let json = serde_json::to_string(&history).unwrap();
        assert!(json.starts_with('['));

        let back: ConversationHistory = serde_json::from_str(&json).unwrap();
        assert_eq!(back, history);
    }
}
