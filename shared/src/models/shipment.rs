//! Shipment models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A deposit→market transfer (or a market→deposit return)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shipment {
    pub id: Uuid,
    /// The SENT (or RETURNED) movement this shipment was created with
    pub movement_id: Uuid,
    pub status: ShipmentStatus,
    pub is_origin_deposit: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Shipment lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
    Pending,
    ReceivedOk,
    ReceivedNoOk,
    Returned,
}

impl ShipmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentStatus::Pending => "PENDING",
            ShipmentStatus::ReceivedOk => "RECEIVED_OK",
            ShipmentStatus::ReceivedNoOk => "RECEIVED_NO_OK",
            ShipmentStatus::Returned => "RETURNED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(ShipmentStatus::Pending),
            "RECEIVED_OK" => Some(ShipmentStatus::ReceivedOk),
            "RECEIVED_NO_OK" => Some(ShipmentStatus::ReceivedNoOk),
            "RETURNED" => Some(ShipmentStatus::Returned),
            _ => None,
        }
    }

    /// Only pending shipments can still be edited or received
    pub fn is_open(&self) -> bool {
        matches!(self, ShipmentStatus::Pending)
    }
}
