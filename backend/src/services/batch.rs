//! Batch service: production registration, batch editing, and discards
//!
//! Registration and discard are ledger mutations; both write a movement
//! with detail rows and apply counter deltas inside one transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::ledger;
use shared::models::{BatchCounters, DiscardReason, LedgerOp, MovementType};
use shared::validation::validate_quantity;

/// How long a production registration may run before it is abandoned
/// and rolled back.
const REGISTRATION_TIMEOUT: Duration = Duration::from_millis(15_000);

/// Batch service
#[derive(Clone)]
pub struct BatchService {
    db: PgPool,
}

/// Input for registering a production run
#[derive(Debug, Deserialize)]
pub struct RegisterProductionInput {
    pub product_id: Uuid,
    pub quantity: i32,
    pub notes: Option<String>,
}

/// Input for editing a batch that has no movements yet
#[derive(Debug, Deserialize)]
pub struct EditBatchInput {
    pub product_id: Option<Uuid>,
    pub quantity: Option<i32>,
}

/// Input for discarding units from a batch
#[derive(Debug, Deserialize)]
pub struct DiscardInput {
    pub batch_id: Uuid,
    pub quantity: i32,
    pub reason: DiscardReason,
    pub notes: Option<String>,
}

/// Batch row as stored
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct BatchRecord {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_code: String,
    pub initial_quantity: i32,
    pub deposit_quantity: i32,
    pub sent_quantity: i32,
    pub market_quantity: i32,
    pub reserved_quantity: i32,
    pub sold_quantity: i32,
    pub discarded_quantity: i32,
    pub discrepancy_quantity: i32,
    pub received_quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BatchRecord {
    fn counters(&self) -> BatchCounters {
        BatchCounters {
            deposit: self.deposit_quantity,
            sent: self.sent_quantity,
            market: self.market_quantity,
            reserved: self.reserved_quantity,
            sold: self.sold_quantity,
            discarded: self.discarded_quantity,
            discrepancy: self.discrepancy_quantity,
        }
    }

    pub fn has_movement(&self) -> bool {
        self.counters().has_movement(self.initial_quantity)
    }
}

/// Batch plus the derived editability flag
#[derive(Debug, Serialize)]
pub struct BatchResponse {
    #[serde(flatten)]
    pub batch: BatchRecord,
    pub has_movement: bool,
}

impl From<BatchRecord> for BatchResponse {
    fn from(batch: BatchRecord) -> Self {
        let has_movement = batch.has_movement();
        Self { batch, has_movement }
    }
}

const BATCH_COLUMNS: &str = "b.id, b.product_id, p.name AS product_name, p.code AS product_code, \
                             b.initial_quantity, b.deposit_quantity, b.sent_quantity, \
                             b.market_quantity, b.reserved_quantity, b.sold_quantity, \
                             b.discarded_quantity, b.discrepancy_quantity, b.received_quantity, \
                             b.created_at, b.updated_at";

impl BatchService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Register a production run: create the batch and its STORED movement
    ///
    /// The whole write runs under a timeout; if it does not finish in
    /// time the transaction is dropped and rolled back, leaving no
    /// half-registered batch behind.
    pub async fn register_production(
        &self,
        user_id: Uuid,
        input: RegisterProductionInput,
    ) -> AppResult<BatchResponse> {
        validate_quantity(input.quantity).map_err(|msg| AppError::Validation {
            field: "quantity".to_string(),
            message: msg.to_string(),
            message_es: "La cantidad debe ser mayor a cero".to_string(),
        })?;

        let result = tokio::time::timeout(
            REGISTRATION_TIMEOUT,
            self.register_production_inner(user_id, input),
        )
        .await;

        match result {
            Ok(outcome) => outcome,
            Err(_) => Err(AppError::OperationTimeout),
        }
    }

    async fn register_production_inner(
        &self,
        user_id: Uuid,
        input: RegisterProductionInput,
    ) -> AppResult<BatchResponse> {
        let product_active = sqlx::query_scalar::<_, bool>(
            "SELECT is_active FROM products WHERE id = $1",
        )
        .bind(input.product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        if !product_active {
            return Err(AppError::Conflict {
                resource: "product".to_string(),
                message: "Cannot register production for a deactivated product".to_string(),
                message_es: "No se puede registrar producción de un producto dado de baja".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;

        let op = LedgerOp::Store {
            quantity: input.quantity,
        };

        let batch_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO batches (product_id, initial_quantity, deposit_quantity)
            VALUES ($1, $2, $2)
            RETURNING id
            "#,
        )
        .bind(input.product_id)
        .bind(input.quantity)
        .fetch_one(&mut *tx)
        .await?;

        let movement_id = ledger::insert_movement(
            &mut tx,
            op.movement_type(),
            user_id,
            None,
            input.notes.as_deref(),
        )
        .await?;
        ledger::insert_movement_detail(&mut tx, movement_id, batch_id, input.quantity).await?;

        tx.commit().await?;

        tracing::info!(%batch_id, quantity = input.quantity, "production registered");

        self.get_batch(batch_id).await
    }

    /// Edit a batch that has no movements beyond its initial storage
    ///
    /// Rewrites initial and deposit quantities together and records an
    /// EDITED movement carrying the new quantity.
    pub async fn edit_batch(
        &self,
        user_id: Uuid,
        batch_id: Uuid,
        input: EditBatchInput,
    ) -> AppResult<BatchResponse> {
        if let Some(quantity) = input.quantity {
            validate_quantity(quantity).map_err(|msg| AppError::Validation {
                field: "quantity".to_string(),
                message: msg.to_string(),
                message_es: "La cantidad debe ser mayor a cero".to_string(),
            })?;
        }

        let mut tx = self.db.begin().await?;

        let (initial, counters) = ledger::lock_batch_counters(&mut tx, batch_id).await?;

        if counters.has_movement(initial) {
            return Err(AppError::BatchHasMovements(
                "Batch already has movements and can no longer be edited".to_string(),
            ));
        }

        if let Some(product_id) = input.product_id {
            let exists = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM products WHERE id = $1 AND is_active = true",
            )
            .bind(product_id)
            .fetch_one(&mut *tx)
            .await?;
            if exists == 0 {
                return Err(AppError::NotFound("Product".to_string()));
            }
        }

        let new_quantity = input.quantity.unwrap_or(initial);

        sqlx::query(
            r#"
            UPDATE batches
            SET product_id = COALESCE($2, product_id),
                initial_quantity = $3,
                deposit_quantity = $3,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(batch_id)
        .bind(input.product_id)
        .bind(new_quantity)
        .execute(&mut *tx)
        .await?;

        let movement_id =
            ledger::insert_movement(&mut tx, MovementType::Edited, user_id, None, None).await?;
        ledger::insert_movement_detail(&mut tx, movement_id, batch_id, new_quantity).await?;

        tx.commit().await?;

        self.get_batch(batch_id).await
    }

    /// Discard units from a batch's deposit stock
    pub async fn discard(&self, user_id: Uuid, input: DiscardInput) -> AppResult<BatchResponse> {
        validate_quantity(input.quantity).map_err(|msg| AppError::Validation {
            field: "quantity".to_string(),
            message: msg.to_string(),
            message_es: "La cantidad debe ser mayor a cero".to_string(),
        })?;

        let mut tx = self.db.begin().await?;

        let (_, counters) = ledger::lock_batch_counters(&mut tx, input.batch_id).await?;

        if counters.deposit < input.quantity {
            return Err(AppError::InsufficientStock(format!(
                "Batch has {} units in deposit, cannot discard {}",
                counters.deposit, input.quantity
            )));
        }

        let op = LedgerOp::Discard {
            quantity: input.quantity,
        };

        let movement_id = ledger::insert_movement(
            &mut tx,
            op.movement_type(),
            user_id,
            None,
            input.notes.as_deref(),
        )
        .await?;
        ledger::insert_movement_detail(&mut tx, movement_id, input.batch_id, input.quantity)
            .await?;
        ledger::apply_deltas(&mut tx, input.batch_id, &op.deltas()).await?;

        sqlx::query(
            r#"
            INSERT INTO discards (movement_id, batch_id, reason, quantity, notes)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(movement_id)
        .bind(input.batch_id)
        .bind(input.reason.as_str())
        .bind(input.quantity)
        .bind(&input.notes)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get_batch(input.batch_id).await
    }

    /// Get a single batch with its product name
    pub async fn get_batch(&self, batch_id: Uuid) -> AppResult<BatchResponse> {
        let batch = sqlx::query_as::<_, BatchRecord>(&format!(
            r#"
            SELECT {BATCH_COLUMNS}
            FROM batches b
            JOIN products p ON p.id = b.product_id
            WHERE b.id = $1
            "#,
        ))
        .bind(batch_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Batch".to_string()))?;

        Ok(batch.into())
    }

    /// List batches, newest first, optionally filtered by product
    pub async fn list_batches(&self, product_id: Option<Uuid>) -> AppResult<Vec<BatchResponse>> {
        let batches = sqlx::query_as::<_, BatchRecord>(&format!(
            r#"
            SELECT {BATCH_COLUMNS}
            FROM batches b
            JOIN products p ON p.id = b.product_id
            WHERE $1::uuid IS NULL OR b.product_id = $1
            ORDER BY b.created_at DESC
            "#,
        ))
        .bind(product_id)
        .fetch_all(&self.db)
        .await?;

        Ok(batches.into_iter().map(BatchResponse::from).collect())
    }
}
