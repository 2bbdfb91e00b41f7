//! Movement log models
//!
//! Movements are an append-only record of every inventory-affecting
//! action. They are created, never mutated or deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Types of inventory movements
///
/// The string values are stored as-is and must stay compatible with
/// existing data, so they never change.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
    /// Production registered into the deposit
    Stored,
    /// Shipment dispatched from deposit to market
    Sent,
    /// Shipment confirmed received at the market
    ReceivedMarket,
    /// Stock returned from market to deposit
    Returned,
    /// Stock discarded from the deposit
    Discarded,
    /// Customer order placed, market stock reserved
    Ordered,
    /// Order marked ready to deliver (audit only)
    ReadyToDeliver,
    /// Order payment confirmed, reservation sold
    Sold,
    /// Order delivered (audit only)
    Delivered,
    /// Order canceled, stock restored to market
    Canceled,
    /// Batch edited before any downstream movement
    Edited,
}

impl MovementType {
    pub const ALL: [MovementType; 11] = [
        MovementType::Stored,
        MovementType::Sent,
        MovementType::ReceivedMarket,
        MovementType::Returned,
        MovementType::Discarded,
        MovementType::Ordered,
        MovementType::ReadyToDeliver,
        MovementType::Sold,
        MovementType::Delivered,
        MovementType::Canceled,
        MovementType::Edited,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Stored => "STORED",
            MovementType::Sent => "SENT",
            MovementType::ReceivedMarket => "RECEIVED_MARKET",
            MovementType::Returned => "RETURNED",
            MovementType::Discarded => "DISCARDED",
            MovementType::Ordered => "ORDERED",
            MovementType::ReadyToDeliver => "READY_TO_DELIVER",
            MovementType::Sold => "SOLD",
            MovementType::Delivered => "DELIVERED",
            MovementType::Canceled => "CANCELED",
            MovementType::Edited => "EDITED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == s)
    }
}

impl std::fmt::Display for MovementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable log entry of one inventory-affecting action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movement {
    pub id: Uuid,
    pub movement_type: MovementType,
    /// Staff member the action is attributed to
    pub user_id: Uuid,
    pub order_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A child row of a movement naming one batch and a quantity delta
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementDetail {
    pub id: Uuid,
    pub movement_id: Uuid,
    pub batch_id: Uuid,
    pub quantity: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_type_wire_values() {
        // These values are stored data; they must never change.
        let expected = [
            "STORED",
            "SENT",
            "RECEIVED_MARKET",
            "RETURNED",
            "DISCARDED",
            "ORDERED",
            "READY_TO_DELIVER",
            "SOLD",
            "DELIVERED",
            "CANCELED",
            "EDITED",
        ];
        for (t, s) in MovementType::ALL.iter().zip(expected) {
            assert_eq!(t.as_str(), s);
        }
    }

    #[test]
    fn test_movement_type_round_trip() {
        for t in MovementType::ALL {
            assert_eq!(MovementType::from_str(t.as_str()), Some(t));
        }
        assert_eq!(MovementType::from_str("SHIPPED"), None);
    }

    #[test]
    fn test_serde_matches_as_str() {
        for t in MovementType::ALL {
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, format!("\"{}\"", t.as_str()));
        }
    }
}
