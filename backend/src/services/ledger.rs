//! Ledger persistence helpers
//!
//! Every mutation service builds on these: insert a movement, insert
//! its detail rows, and apply counter deltas to a batch, all inside
//! the caller's transaction so partial application cannot occur.
//! The deltas themselves come from the pure core in
//! `shared::models::LedgerOp`.

use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::{BatchCounters, CounterDelta, MovementType};

/// Insert a movement row and return its id
pub async fn insert_movement(
    tx: &mut Transaction<'_, Postgres>,
    movement_type: MovementType,
    user_id: Uuid,
    order_id: Option<Uuid>,
    notes: Option<&str>,
) -> AppResult<Uuid> {
    let movement_id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO movements (movement_type, user_id, order_id, notes)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(movement_type.as_str())
    .bind(user_id)
    .bind(order_id)
    .bind(notes)
    .fetch_one(&mut **tx)
    .await?;

    Ok(movement_id)
}

/// Insert a movement detail row linking a batch and a quantity delta
pub async fn insert_movement_detail(
    tx: &mut Transaction<'_, Postgres>,
    movement_id: Uuid,
    batch_id: Uuid,
    quantity: i32,
) -> AppResult<Uuid> {
    let detail_id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO movement_details (movement_id, batch_id, quantity)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(movement_id)
    .bind(batch_id)
    .bind(quantity)
    .fetch_one(&mut **tx)
    .await?;

    Ok(detail_id)
}

/// Apply counter deltas to a batch, one UPDATE per delta
///
/// Column names come from `CounterField::column`, a fixed set; only the
/// amounts are bound.
pub async fn apply_deltas(
    tx: &mut Transaction<'_, Postgres>,
    batch_id: Uuid,
    deltas: &[CounterDelta],
) -> AppResult<()> {
    for delta in deltas {
        let sql = format!(
            "UPDATE batches SET {0} = {0} + $1, updated_at = NOW() WHERE id = $2",
            delta.field.column()
        );
        let result = sqlx::query(&sql)
            .bind(delta.amount)
            .bind(batch_id)
            .execute(&mut **tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Batch".to_string()));
        }
    }
    Ok(())
}

#[derive(Debug, sqlx::FromRow)]
struct CounterRow {
    initial_quantity: i32,
    deposit_quantity: i32,
    sent_quantity: i32,
    market_quantity: i32,
    reserved_quantity: i32,
    sold_quantity: i32,
    discarded_quantity: i32,
    discrepancy_quantity: i32,
}

/// Lock a batch row and return its initial quantity and counters
///
/// `FOR UPDATE` holds the row for the rest of the transaction so two
/// concurrent mutations of the same batch cannot both read stale
/// counters.
pub async fn lock_batch_counters(
    tx: &mut Transaction<'_, Postgres>,
    batch_id: Uuid,
) -> AppResult<(i32, BatchCounters)> {
    let row = sqlx::query_as::<_, CounterRow>(
        r#"
        SELECT initial_quantity, deposit_quantity, sent_quantity, market_quantity,
               reserved_quantity, sold_quantity, discarded_quantity, discrepancy_quantity
        FROM batches
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(batch_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Batch".to_string()))?;

    Ok((
        row.initial_quantity,
        BatchCounters {
            deposit: row.deposit_quantity,
            sent: row.sent_quantity,
            market: row.market_quantity,
            reserved: row.reserved_quantity,
            sold: row.sold_quantity,
            discarded: row.discarded_quantity,
            discrepancy: row.discrepancy_quantity,
        },
    ))
}

/// Batch reference and quantity of one movement detail
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct DetailRow {
    pub batch_id: Uuid,
    pub quantity: i32,
}

/// Fetch the detail rows of a movement, locking their batches
pub async fn fetch_movement_details(
    tx: &mut Transaction<'_, Postgres>,
    movement_id: Uuid,
) -> AppResult<Vec<DetailRow>> {
    let rows = sqlx::query_as::<_, DetailRow>(
        r#"
        SELECT md.batch_id, md.quantity
        FROM movement_details md
        JOIN batches b ON b.id = md.batch_id
        WHERE md.movement_id = $1
        ORDER BY md.created_at
        FOR UPDATE OF b
        "#,
    )
    .bind(movement_id)
    .fetch_all(&mut **tx)
    .await?;

    Ok(rows)
}

/// Delete the detail rows of a movement (edit actions replace them)
pub async fn delete_movement_details(
    tx: &mut Transaction<'_, Postgres>,
    movement_id: Uuid,
) -> AppResult<u64> {
    let result = sqlx::query("DELETE FROM movement_details WHERE movement_id = $1")
        .bind(movement_id)
        .execute(&mut **tx)
        .await?;

    Ok(result.rows_affected())
}
