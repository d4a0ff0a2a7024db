//! Conversation stage descriptors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role that opens a given stage of the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitiatingRole {
    Advisor,
    Client,
}

impl fmt::Display for InitiatingRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InitiatingRole::Advisor => "advisor",
            InitiatingRole::Client => "client",
        };
        write!(f, "{}", s)
    }
}

/// Immutable stage descriptor, keyed by (product, order number).
///
/// Stage numbers are 1-based and contiguous within a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub number: u32,
    pub name: String,
    pub objective: String,
    pub initiator: InitiatingRole,
}

impl Stage {
    /// Creates a stage descriptor.
    pub fn new(
        number: u32,
        name: impl Into<String>,
        objective: impl Into<String>,
        initiator: InitiatingRole,
    ) -> Self {
        Self {
            number,
            name: name.into(),
            objective: objective.into(),
            initiator,
        }
    }

    /// Returns true when the simulated client opens this stage.
    pub fn is_client_initiated(&self) -> bool {
        self.initiator == InitiatingRole::Client
    }

    /// Messages that must be recorded for this stage before it can advance.
    ///
    /// A client-initiated stage already holds one opening line before the
    /// advisor's first real turn, so the threshold is one higher there.
    pub fn minimum_exchanges(&self) -> u32 {
        match self.initiator {
            InitiatingRole::Client => 3,
            InitiatingRole::Advisor => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advisor_initiated_stage_requires_two_exchanges() {
        let stage = Stage::new(1, "Saludo", "Abrir la conversación", InitiatingRole::Advisor);
        assert_eq!(stage.minimum_exchanges(), 2);
        assert!(!stage.is_client_initiated());
    }

    #[test]
    fn client_initiated_stage_requires_three_exchanges() {
        let stage = Stage::new(
            4,
            "Objeciones y dudas",
            "Resolver las objeciones del cliente",
            InitiatingRole::Client,
        );
        assert_eq!(stage.minimum_exchanges(), 3);
        assert!(stage.is_client_initiated());
    }

    #[test]
    fn initiating_role_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&InitiatingRole::Advisor).unwrap(),
            "\"advisor\""
        );
        assert_eq!(
            serde_json::to_string(&InitiatingRole::Client).unwrap(),
            "\"client\""
        );
    }
}
