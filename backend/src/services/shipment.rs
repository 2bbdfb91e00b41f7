//! Shipment service: deposit→market transfers, receptions, and returns

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::ledger;
use shared::models::{reverse_deltas, LedgerOp, MovementType, ShipmentStatus};
use shared::validation::{validate_discrepancy, validate_quantity};

/// Shipment service
#[derive(Clone)]
pub struct ShipmentService {
    db: PgPool,
}

/// One batch line of a shipment action
#[derive(Debug, Deserialize)]
pub struct ShipmentItemInput {
    pub batch_id: Uuid,
    pub quantity: i32,
    #[serde(default)]
    pub discrepancy_quantity: i32,
}

/// Input for creating a shipment in either direction
#[derive(Debug, Deserialize)]
pub struct CreateShipmentInput {
    pub is_origin_deposit: bool,
    pub items: Vec<ShipmentItemInput>,
    pub notes: Option<String>,
}

/// Input for editing a pending deposit→market shipment
#[derive(Debug, Deserialize)]
pub struct EditShipmentInput {
    pub items: Vec<ShipmentItemInput>,
}

/// Input for confirming reception at the market
#[derive(Debug, Deserialize)]
pub struct ReceiveShipmentInput {
    pub has_discrepancy: bool,
    pub items: Vec<ShipmentItemInput>,
}

/// Shipment row as stored
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ShipmentRecord {
    pub id: Uuid,
    pub movement_id: Uuid,
    pub status: String,
    pub is_origin_deposit: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One batch line of a shipment, joined with its product
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ShipmentDetailRecord {
    pub batch_id: Uuid,
    pub product_name: String,
    pub product_code: String,
    pub quantity: i32,
}

/// Shipment plus its detail lines
#[derive(Debug, Serialize)]
pub struct ShipmentResponse {
    #[serde(flatten)]
    pub shipment: ShipmentRecord,
    pub items: Vec<ShipmentDetailRecord>,
}

fn check_items(items: &[ShipmentItemInput]) -> AppResult<()> {
    if items.is_empty() {
        return Err(AppError::ValidationError(
            "Shipment must have at least one item".to_string(),
        ));
    }
    let mut seen = HashSet::new();
    for item in items {
        if !seen.insert(item.batch_id) {
            return Err(AppError::ValidationError(
                "Shipment items must reference each batch at most once".to_string(),
            ));
        }
        validate_quantity(item.quantity).map_err(|msg| AppError::Validation {
            field: "quantity".to_string(),
            message: msg.to_string(),
            message_es: "La cantidad debe ser mayor a cero".to_string(),
        })?;
        validate_discrepancy(item.discrepancy_quantity).map_err(|msg| AppError::Validation {
            field: "discrepancy_quantity".to_string(),
            message: msg.to_string(),
            message_es: "La discrepancia no puede ser negativa".to_string(),
        })?;
    }
    Ok(())
}

/// Reception lines must cover every batch the shipment sent, and each
/// line must fully account for that batch's sent quantity. A partial
/// reception would otherwise strand the omitted units in transit, since
/// the shipment leaves PENDING for good.
fn check_reception(
    sent_by_batch: &HashMap<Uuid, i32>,
    items: &[ShipmentItemInput],
) -> AppResult<()> {
    for item in items {
        let sent = sent_by_batch.get(&item.batch_id).ok_or_else(|| {
            AppError::ValidationError(
                "Reception references a batch that is not part of the shipment".to_string(),
            )
        })?;

        if item.quantity + item.discrepancy_quantity != *sent {
            return Err(AppError::ValidationError(format!(
                "Received {} plus discrepancy {} must account for the {} units sent",
                item.quantity, item.discrepancy_quantity, sent
            )));
        }
    }

    // Items are unique per batch, so matching lengths means full coverage
    if items.len() != sent_by_batch.len() {
        return Err(AppError::ValidationError(
            "Reception must account for every batch of the shipment".to_string(),
        ));
    }
    Ok(())
}

impl ShipmentService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a shipment
    ///
    /// Deposit→market moves stock into transit (SENT, status PENDING).
    /// Market→deposit is a return: it empties each batch's market stock
    /// back into deposit, routing any shortfall to the discrepancy
    /// counter, and the shipment is final (status RETURNED).
    pub async fn create_shipment(
        &self,
        user_id: Uuid,
        input: CreateShipmentInput,
    ) -> AppResult<ShipmentResponse> {
        check_items(&input.items)?;

        let mut tx = self.db.begin().await?;

        let (movement_type, status) = if input.is_origin_deposit {
            (MovementType::Sent, ShipmentStatus::Pending)
        } else {
            (MovementType::Returned, ShipmentStatus::Returned)
        };

        let movement_id = ledger::insert_movement(
            &mut tx,
            movement_type,
            user_id,
            None,
            input.notes.as_deref(),
        )
        .await?;

        for item in &input.items {
            let (_, counters) = ledger::lock_batch_counters(&mut tx, item.batch_id).await?;

            let op = if input.is_origin_deposit {
                if counters.deposit < item.quantity {
                    return Err(AppError::InsufficientStock(format!(
                        "Batch has {} units in deposit, cannot ship {}",
                        counters.deposit, item.quantity
                    )));
                }
                LedgerOp::Send {
                    quantity: item.quantity,
                }
            } else {
                // A return accounts for the whole market stock of the batch
                if item.quantity + item.discrepancy_quantity != counters.market {
                    return Err(AppError::ValidationError(format!(
                        "Returned {} plus discrepancy {} must equal the batch's market stock of {}",
                        item.quantity, item.discrepancy_quantity, counters.market
                    )));
                }
                LedgerOp::ReturnToDeposit {
                    quantity: item.quantity,
                    discrepancy: item.discrepancy_quantity,
                }
            };

            ledger::insert_movement_detail(&mut tx, movement_id, item.batch_id, item.quantity)
                .await?;
            ledger::apply_deltas(&mut tx, item.batch_id, &op.deltas()).await?;
        }

        let shipment_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO shipments (movement_id, status, is_origin_deposit, notes)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(movement_id)
        .bind(status.as_str())
        .bind(input.is_origin_deposit)
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(%shipment_id, origin_deposit = input.is_origin_deposit, "shipment created");

        self.get_shipment(shipment_id).await
    }

    /// Edit a pending deposit→market shipment
    ///
    /// Reverses every delta of the prior details, deletes them, then
    /// applies the new item list against the restored counters.
    pub async fn edit_shipment(
        &self,
        shipment_id: Uuid,
        input: EditShipmentInput,
    ) -> AppResult<ShipmentResponse> {
        check_items(&input.items)?;

        let mut tx = self.db.begin().await?;

        let shipment = self.lock_shipment(&mut tx, shipment_id).await?;

        if !shipment.is_origin_deposit || shipment.status != ShipmentStatus::Pending.as_str() {
            return Err(AppError::InvalidStateTransition(
                "Only pending deposit shipments can be edited".to_string(),
            ));
        }

        let old_details = ledger::fetch_movement_details(&mut tx, shipment.movement_id).await?;
        for detail in &old_details {
            let op = LedgerOp::Send {
                quantity: detail.quantity,
            };
            ledger::apply_deltas(&mut tx, detail.batch_id, &reverse_deltas(&op.deltas())).await?;
        }
        ledger::delete_movement_details(&mut tx, shipment.movement_id).await?;

        for item in &input.items {
            let (_, counters) = ledger::lock_batch_counters(&mut tx, item.batch_id).await?;
            if counters.deposit < item.quantity {
                return Err(AppError::InsufficientStock(format!(
                    "Batch has {} units in deposit, cannot ship {}",
                    counters.deposit, item.quantity
                )));
            }
            let op = LedgerOp::Send {
                quantity: item.quantity,
            };
            ledger::insert_movement_detail(&mut tx, shipment.movement_id, item.batch_id, item.quantity)
                .await?;
            ledger::apply_deltas(&mut tx, item.batch_id, &op.deltas()).await?;
        }

        sqlx::query("UPDATE shipments SET updated_at = NOW() WHERE id = $1")
            .bind(shipment_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.get_shipment(shipment_id).await
    }

    /// Confirm reception at the market
    ///
    /// Moves received units from sent to market and any shortfall from
    /// sent to discrepancy; also bumps the batch's cumulative received
    /// counter, which is audit-only and outside the balance sum.
    pub async fn receive_shipment(
        &self,
        user_id: Uuid,
        shipment_id: Uuid,
        input: ReceiveShipmentInput,
    ) -> AppResult<ShipmentResponse> {
        check_items(&input.items)?;

        let mut tx = self.db.begin().await?;

        let shipment = self.lock_shipment(&mut tx, shipment_id).await?;

        if !shipment.is_origin_deposit || shipment.status != ShipmentStatus::Pending.as_str() {
            return Err(AppError::InvalidStateTransition(
                "Only pending deposit shipments can be received".to_string(),
            ));
        }

        let sent_details = ledger::fetch_movement_details(&mut tx, shipment.movement_id).await?;
        let sent_by_batch: HashMap<Uuid, i32> = sent_details
            .iter()
            .map(|d| (d.batch_id, d.quantity))
            .collect();

        check_reception(&sent_by_batch, &input.items)?;

        let status = if input.has_discrepancy {
            ShipmentStatus::ReceivedNoOk
        } else {
            ShipmentStatus::ReceivedOk
        };

        let movement_id =
            ledger::insert_movement(&mut tx, MovementType::ReceivedMarket, user_id, None, None)
                .await?;

        for item in &input.items {
            let op = LedgerOp::ReceiveAtMarket {
                quantity: item.quantity,
                discrepancy: item.discrepancy_quantity,
            };

            ledger::lock_batch_counters(&mut tx, item.batch_id).await?;
            ledger::insert_movement_detail(&mut tx, movement_id, item.batch_id, item.quantity)
                .await?;
            ledger::apply_deltas(&mut tx, item.batch_id, &op.deltas()).await?;

            sqlx::query(
                "UPDATE batches SET received_quantity = received_quantity + $1 WHERE id = $2",
            )
            .bind(item.quantity)
            .bind(item.batch_id)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("UPDATE shipments SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(shipment_id)
            .bind(status.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(%shipment_id, status = status.as_str(), "shipment received");

        self.get_shipment(shipment_id).await
    }

    /// Get a shipment with its detail lines
    pub async fn get_shipment(&self, shipment_id: Uuid) -> AppResult<ShipmentResponse> {
        let shipment = sqlx::query_as::<_, ShipmentRecord>(
            r#"
            SELECT id, movement_id, status, is_origin_deposit, notes, created_at, updated_at
            FROM shipments
            WHERE id = $1
            "#,
        )
        .bind(shipment_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Shipment".to_string()))?;

        let items = sqlx::query_as::<_, ShipmentDetailRecord>(
            r#"
            SELECT md.batch_id, p.name AS product_name, p.code AS product_code, md.quantity
            FROM movement_details md
            JOIN batches b ON b.id = md.batch_id
            JOIN products p ON p.id = b.product_id
            WHERE md.movement_id = $1
            ORDER BY md.created_at
            "#,
        )
        .bind(shipment.movement_id)
        .fetch_all(&self.db)
        .await?;

        Ok(ShipmentResponse { shipment, items })
    }

    /// List shipments, newest first, optionally filtered by status
    pub async fn list_shipments(
        &self,
        status: Option<ShipmentStatus>,
    ) -> AppResult<Vec<ShipmentRecord>> {
        let shipments = sqlx::query_as::<_, ShipmentRecord>(
            r#"
            SELECT id, movement_id, status, is_origin_deposit, notes, created_at, updated_at
            FROM shipments
            WHERE $1::text IS NULL OR status = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.db)
        .await?;

        Ok(shipments)
    }

    async fn lock_shipment(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        shipment_id: Uuid,
    ) -> AppResult<ShipmentRecord> {
        sqlx::query_as::<_, ShipmentRecord>(
            r#"
            SELECT id, movement_id, status, is_origin_deposit, notes, created_at, updated_at
            FROM shipments
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(shipment_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Shipment".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(batch_id: Uuid, quantity: i32, discrepancy_quantity: i32) -> ShipmentItemInput {
        ShipmentItemInput {
            batch_id,
            quantity,
            discrepancy_quantity,
        }
    }

    #[test]
    fn test_duplicate_batch_lines_rejected() {
        let batch = Uuid::new_v4();
        assert!(check_items(&[item(batch, 5, 0), item(batch, 3, 0)]).is_err());
        assert!(check_items(&[item(batch, 5, 0), item(Uuid::new_v4(), 3, 0)]).is_ok());
    }

    #[test]
    fn test_reception_must_cover_every_sent_batch() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let sent: HashMap<Uuid, i32> = [(a, 10), (b, 10)].into_iter().collect();

        // Omitting a batch would strand its units in transit
        assert!(check_reception(&sent, &[item(a, 10, 0)]).is_err());

        assert!(check_reception(&sent, &[item(a, 10, 0), item(b, 7, 3)]).is_ok());
    }

    #[test]
    fn test_reception_line_must_account_for_sent_quantity() {
        let a = Uuid::new_v4();
        let sent: HashMap<Uuid, i32> = [(a, 10)].into_iter().collect();

        assert!(check_reception(&sent, &[item(a, 8, 1)]).is_err());
        assert!(check_reception(&sent, &[item(a, 8, 2)]).is_ok());
    }

    #[test]
    fn test_reception_rejects_unknown_batch() {
        let sent: HashMap<Uuid, i32> = [(Uuid::new_v4(), 10)].into_iter().collect();
        assert!(check_reception(&sent, &[item(Uuid::new_v4(), 10, 0)]).is_err());
    }
}
