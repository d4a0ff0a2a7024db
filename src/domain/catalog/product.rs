//! Static product catalog with per-product stage sequences.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::{InitiatingRole, Segment, Stage};

/// A bank product that can be sold during a simulation.
///
/// Products are static data: stages never change at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub slug: String,
    pub name: String,
    pub stages: Vec<Stage>,
    pub compatible_segments: Vec<Segment>,
}

impl Product {
    /// Number of stages in this product's conversation flow.
    pub fn total_stages(&self) -> u32 {
        self.stages.len() as u32
    }

    /// Looks up a stage by its 1-based order number.
    pub fn stage(&self, number: u32) -> Option<&Stage> {
        self.stages.iter().find(|s| s.number == number)
    }

    /// The first stage of the flow.
    pub fn first_stage(&self) -> &Stage {
        &self.stages[0]
    }

    /// Returns true when the given stage number is the last of the flow.
    pub fn is_last_stage(&self, number: u32) -> bool {
        number == self.total_stages()
    }
}

fn stage(number: u32, name: &str, objective: &str, initiator: InitiatingRole) -> Stage {
    Stage::new(number, name, objective, initiator)
}

static CATALOG: Lazy<Vec<Product>> = Lazy::new(|| {
    use InitiatingRole::{Advisor, Client};

    vec![
        Product {
            slug: "cuenta-ahorros".to_string(),
            name: "Cuenta de Ahorros".to_string(),
            stages: vec![
                stage(1, "Saludo y apertura", "Generar confianza y abrir la conversación con el cliente", Advisor),
                stage(2, "Indagación de necesidades", "Descubrir la situación financiera y las necesidades de ahorro del cliente", Advisor),
                stage(3, "Presentación del producto", "Explicar la cuenta de ahorros y conectarla con las necesidades detectadas", Advisor),
                stage(4, "Objeciones y dudas", "Escuchar y resolver las objeciones que plantea el cliente", Client),
                stage(5, "Manejo de objeciones", "Convertir las objeciones en argumentos de valor para el cliente", Advisor),
                stage(6, "Cierre de la venta", "Concretar la apertura de la cuenta con un acuerdo explícito", Advisor),
                stage(7, "Despedida y próximos pasos", "Cerrar cordialmente y acordar los pasos de vinculación", Advisor),
            ],
            compatible_segments: vec![
                Segment::Estudiante,
                Segment::JovenProfesional,
                Segment::Asalariado,
                Segment::Independiente,
                Segment::Pensionado,
            ],
        },
        Product {
            slug: "tarjeta-credito".to_string(),
            name: "Tarjeta de Crédito".to_string(),
            stages: vec![
                stage(1, "Recepción del cliente", "Atender al cliente que llega preguntando por la tarjeta", Client),
                stage(2, "Indagación de necesidades", "Entender los hábitos de consumo y la capacidad de pago del cliente", Advisor),
                stage(3, "Presentación de beneficios", "Mostrar cuotas de manejo, cupo y beneficios relevantes para el cliente", Advisor),
                stage(4, "Objeciones y dudas", "Escuchar las dudas del cliente sobre tasas y costos", Client),
                stage(5, "Manejo de objeciones", "Aclarar costos reales y desmontar temores infundados", Advisor),
                stage(6, "Cierre de la venta", "Obtener la aceptación de la solicitud de la tarjeta", Advisor),
                stage(7, "Despedida", "Despedirse y explicar la entrega y activación del plástico", Advisor),
            ],
            compatible_segments: vec![
                Segment::JovenProfesional,
                Segment::Asalariado,
                Segment::Independiente,
            ],
        },
        Product {
            slug: "credito-libre".to_string(),
            name: "Crédito de Libre Inversión".to_string(),
            stages: vec![
                stage(1, "Saludo y apertura", "Generar confianza y abrir la conversación con el cliente", Advisor),
                stage(2, "Exploración del proyecto", "Entender el destino del crédito y la capacidad de endeudamiento", Advisor),
                stage(3, "Presentación de la oferta", "Presentar monto, plazo y cuota ajustados al proyecto del cliente", Advisor),
                stage(4, "Objeciones y dudas", "Escuchar las inquietudes del cliente sobre tasas y plazos", Client),
                stage(5, "Cierre de la venta", "Concretar la solicitud del crédito con condiciones acordadas", Advisor),
                stage(6, "Despedida", "Cerrar cordialmente e indicar los documentos requeridos", Advisor),
            ],
            compatible_segments: vec![
                Segment::Asalariado,
                Segment::Independiente,
                Segment::Pensionado,
            ],
        },
    ]
});

/// Returns the full static product catalog.
pub fn catalog() -> &'static [Product] {
    &CATALOG
}

/// Resolves a product by slug or display name, case-insensitively.
pub fn resolve(choice: &str) -> Option<&'static Product> {
    let wanted = choice.trim();
    CATALOG
        .iter()
        .find(|p| p.slug.eq_ignore_ascii_case(wanted) || p.name.eq_ignore_ascii_case(wanted))
}
