//! Psychological client archetypes used to flavor generated scenarios.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Psychological profile the simulated client plays during the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientType {
    Analitico,
    Impulsivo,
    Desconfiado,
    Indeciso,
    Negociador,
}

impl ClientType {
    /// Returns all archetypes.
    pub fn all() -> &'static [ClientType] {
        &[
            ClientType::Analitico,
            ClientType::Impulsivo,
            ClientType::Desconfiado,
            ClientType::Indeciso,
            ClientType::Negociador,
        ]
    }

    /// Returns the display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            ClientType::Analitico => "Analítico",
            ClientType::Impulsivo => "Impulsivo",
            ClientType::Desconfiado => "Desconfiado",
            ClientType::Indeciso => "Indeciso",
            ClientType::Negociador => "Negociador",
        }
    }

    /// Short behavioral descriptor handed to the scenario generator.
    pub fn descriptor(&self) -> &'static str {
        match self {
            ClientType::Analitico => {
                "Pide cifras, compara tasas y lee la letra pequeña antes de decidir"
            }
            ClientType::Impulsivo => {
                "Decide rápido, se entusiasma con los beneficios inmediatos y se aburre con los detalles"
            }
            ClientType::Desconfiado => {
                "Cuestiona las intenciones del banco y busca cláusulas ocultas en cada oferta"
            }
            ClientType::Indeciso => {
                "Cambia de opinión varias veces y necesita que le confirmen cada paso"
            }
            ClientType::Negociador => {
                "Siempre pide una condición mejor: menos comisión, más cupo, mejor tasa"
            }
        }
    }
}

impl fmt::Display for ClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_returns_five_archetypes() {
        assert_eq!(ClientType::all().len(), 5);
    }

    #[test]
    fn every_archetype_has_a_descriptor() {
        for ct in ClientType::all() {
            assert!(!ct.descriptor().is_empty());
            assert!(!ct.display_name().is_empty());
        }
    }

    #[test]
    fn serializes_to_snake_case() {
        let json = serde_json::to_string(&ClientType::Desconfiado).unwrap();
        assert_eq!(json, "\"desconfiado\"");
    }
}
