//! Customer models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A buyer identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub fiscal_condition: FiscalCondition,
    /// CUIT tax identifier, checksum validated on creation
    pub tax_id: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fiscal condition of a customer for invoicing purposes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FiscalCondition {
    ResponsableInscripto,
    Monotributo,
    ConsumidorFinal,
    Exento,
}

impl FiscalCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            FiscalCondition::ResponsableInscripto => "RESPONSABLE_INSCRIPTO",
            FiscalCondition::Monotributo => "MONOTRIBUTO",
            FiscalCondition::ConsumidorFinal => "CONSUMIDOR_FINAL",
            FiscalCondition::Exento => "EXENTO",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "RESPONSABLE_INSCRIPTO" => Some(FiscalCondition::ResponsableInscripto),
            "MONOTRIBUTO" => Some(FiscalCondition::Monotributo),
            "CONSUMIDOR_FINAL" => Some(FiscalCondition::ConsumidorFinal),
            "EXENTO" => Some(FiscalCondition::Exento),
            _ => None,
        }
    }
}
