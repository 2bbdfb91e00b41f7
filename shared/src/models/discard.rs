//! Discard models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A record of deposit stock written off
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discard {
    pub id: Uuid,
    /// The DISCARDED movement this record belongs to
    pub movement_id: Uuid,
    pub batch_id: Uuid,
    pub reason: DiscardReason,
    pub quantity: i32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Why stock was discarded
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscardReason {
    Expired,
    Damaged,
    Other,
}

impl DiscardReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscardReason::Expired => "EXPIRED",
            DiscardReason::Damaged => "DAMAGED",
            DiscardReason::Other => "OTHER",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "EXPIRED" => Some(DiscardReason::Expired),
            "DAMAGED" => Some(DiscardReason::Damaged),
            "OTHER" => Some(DiscardReason::Other),
            _ => None,
        }
    }
}
