//! Generated client persona, immutable for the lifetime of a simulation.

use serde::{Deserialize, Serialize};

/// Gender of the simulated client. Drives avatar selection downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Female,
    Male,
}

/// How much the client already knows about the product family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeLevel {
    Basic,
    Intermediate,
    Advanced,
}

/// The client's appetite for financial risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskProfile {
    Conservative,
    Moderate,
    Aggressive,
}

/// Persona the client model plays for one simulation.
///
/// Generated once at start time and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientProfile {
    pub name: String,
    pub age: u8,
    pub occupation: String,
    pub current_situation: String,
    pub motivation: String,
    pub knowledge_level: KnowledgeLevel,
    pub risk_profile: RiskProfile,
    pub financial_goal: String,
    pub background: String,
    pub gender: Gender,
}

impl ClientProfile {
    /// One-paragraph summary used when prompting the client model.
    pub fn summary(&self) -> String {
        format!(
            "{}, {} años, {}. Situación actual: {}. Motivación: {}. Meta financiera: {}. {}",
            self.name,
            self.age,
            self.occupation,
            self.current_situation,
            self.motivation,
            self.financial_goal,
            self.background,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_profile() -> ClientProfile {
        ClientProfile {
            name: "Marcela Ríos".to_string(),
            age: 31,
            occupation: "Diseñadora independiente".to_string(),
            current_situation: "Ingresos variables, sin productos bancarios".to_string(),
            motivation: "Separar sus ahorros del dinero del día a día".to_string(),
            knowledge_level: KnowledgeLevel::Basic,
            risk_profile: RiskProfile::Conservative,
            financial_goal: "Reunir la cuota inicial de un apartamento".to_string(),
            background: "Ha tenido malas experiencias con cobros inesperados".to_string(),
            gender: Gender::Female,
        }
    }

    #[test]
    fn summary_includes_key_fields() {
        let profile = sample_profile();
        let summary = profile.summary();

        assert!(summary.contains("Marcela Ríos"));
        assert!(summary.contains("31 años"));
        assert!(summary.contains("cuota inicial"));
    }

    #[test]
    fn profile_roundtrips_through_json() {
        let profile = sample_profile();
        let json = serde_json::to_string(&profile).unwrap();
        let back: ClientProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(back, profile);
    }

    #[test]
    fn enums_serialize_snake_case() {
        assert_eq!(
            serde_json::to_string(&KnowledgeLevel::Intermediate).unwrap(),
            "\"intermediate\""
        );
        assert_eq!(
            serde_json::to_string(&RiskProfile::Conservative).unwrap(),
            "\"conservative\""
        );
        assert_eq!(serde_json::to_string(&Gender::Male).unwrap(), "\"male\"");
    }
}
