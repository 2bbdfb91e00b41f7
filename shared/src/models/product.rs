//! Product catalog models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A catalog item
///
/// Products are never deleted, only deactivated, so historical batches
/// and movements always resolve to a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    /// Short unique code (e.g., "TOM-CHE")
    pub code: String,
    pub name: String,
    pub category: String,
    pub product_type: String,
    /// Sale presentation (e.g., "caja x 10kg", "bandeja x 500g")
    pub presentation: String,
    pub unit_price: Decimal,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
