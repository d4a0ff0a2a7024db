//! Socioeconomic client segments, matched against product compatibility.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Socioeconomic segment the simulated client belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    Estudiante,
    JovenProfesional,
    Asalariado,
    Independiente,
    Pensionado,
}

impl Segment {
    /// Returns all segments.
    pub fn all() -> &'static [Segment] {
        &[
            Segment::Estudiante,
            Segment::JovenProfesional,
            Segment::Asalariado,
            Segment::Independiente,
            Segment::Pensionado,
        ]
    }

    /// Returns the display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Segment::Estudiante => "Estudiante",
            Segment::JovenProfesional => "Joven profesional",
            Segment::Asalariado => "Asalariado",
            Segment::Independiente => "Independiente",
            Segment::Pensionado => "Pensionado",
        }
    }

    /// Short socioeconomic descriptor handed to the scenario generator.
    pub fn descriptor(&self) -> &'static str {
        match self {
            Segment::Estudiante => "Estudiante universitario con ingresos ocasionales",
            Segment::JovenProfesional => "Profesional entre 25 y 35 años con su primer empleo formal",
            Segment::Asalariado => "Empleado con contrato indefinido e ingreso fijo mensual",
            Segment::Independiente => "Trabajador por cuenta propia con ingresos variables",
            Segment::Pensionado => "Persona jubilada con mesada pensional estable",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_returns_five_segments() {
        assert_eq!(Segment::all().len(), 5);
    }

    #[test]
    fn serializes_to_snake_case() {
        let json = serde_json::to_string(&Segment::JovenProfesional).unwrap();
        assert_eq!(json, "\"joven_profesional\"");
    }
}
