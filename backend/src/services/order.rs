//! Order service: FIFO-allocated customer orders, payment, and cancellation
//!
//! Allocation planning is pure (`plan_fifo_allocation`); this service
//! feeds it batch rows locked with `FOR UPDATE` so two concurrent
//! orders cannot both pass the sufficiency check on stale reads.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::ledger;
use shared::models::{
    cancellation_allowed, doing_transition_allowed, payment_transition_allowed,
    plan_fifo_allocation, plan_payment, AllocationError, BatchStock, CancelReason, LedgerOp,
    MovementType, OrderStatusDoing, OrderStatusPayment, PaymentMethod,
};
use shared::validation::validate_quantity;

/// Order service
#[derive(Clone)]
pub struct OrderService {
    db: PgPool,
}

/// One product line of an order request
#[derive(Debug, Deserialize)]
pub struct OrderItemInput {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Input for creating an order
#[derive(Debug, Deserialize)]
pub struct CreateOrderInput {
    pub customer_id: Uuid,
    pub items: Vec<OrderItemInput>,
    pub notes: Option<String>,
}

/// Input for editing a pending unpaid order
#[derive(Debug, Deserialize)]
pub struct EditOrderInput {
    pub items: Vec<OrderItemInput>,
}

/// Input for confirming payment of an order
#[derive(Debug, Deserialize)]
pub struct ConfirmOrderInput {
    pub payment_method: PaymentMethod,
    /// Amount collected now; omitted means the whole outstanding
    /// balance. Anything less marks the order PARTIAL_PAID.
    pub amount: Option<Decimal>,
    pub receipt_image_url: Option<String>,
}

/// Input for cancelling an order
#[derive(Debug, Deserialize)]
pub struct CancelOrderInput {
    pub reason: CancelReason,
}

/// Order row as stored
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct OrderRecord {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub status_doing: String,
    pub status_payment: String,
    pub cancel_reason: Option<String>,
    pub total: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One product line of an order, joined with its product
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct OrderDetailRecord {
    pub product_id: Uuid,
    pub product_name: String,
    pub product_code: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

/// Sale row recorded on payment confirmation
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct SaleRecord {
    pub id: Uuid,
    pub payment_method: String,
    pub amount: Decimal,
    pub receipt_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Order plus its lines and sale, if any
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    #[serde(flatten)]
    pub order: OrderRecord,
    pub items: Vec<OrderDetailRecord>,
    pub sale: Option<SaleRecord>,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderStateRow {
    status_doing: String,
    status_payment: String,
    total: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct CandidateBatchRow {
    id: Uuid,
    market_quantity: i32,
}

const ORDER_COLUMNS: &str = "o.id, o.customer_id, c.name AS customer_name, o.status_doing, \
                             o.status_payment, o.cancel_reason, o.total, o.notes, \
                             o.created_at, o.updated_at";

fn check_items(items: &[OrderItemInput]) -> AppResult<()> {
    if items.is_empty() {
        return Err(AppError::ValidationError(
            "Order must have at least one item".to_string(),
        ));
    }
    for item in items {
        validate_quantity(item.quantity).map_err(|msg| AppError::Validation {
            field: "quantity".to_string(),
            message: msg.to_string(),
            message_es: "La cantidad debe ser mayor a cero".to_string(),
        })?;
    }
    Ok(())
}

impl OrderService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create an order, reserving market stock oldest batch first
    pub async fn create_order(
        &self,
        user_id: Uuid,
        input: CreateOrderInput,
    ) -> AppResult<OrderResponse> {
        check_items(&input.items)?;

        let mut tx = self.db.begin().await?;

        let customer_active = sqlx::query_scalar::<_, bool>(
            "SELECT is_active FROM customers WHERE id = $1",
        )
        .bind(input.customer_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer".to_string()))?;

        if !customer_active {
            return Err(AppError::Conflict {
                resource: "customer".to_string(),
                message: "Cannot create an order for a deactivated customer".to_string(),
                message_es: "No se puede crear un pedido para un cliente dado de baja".to_string(),
            });
        }

        let order_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO orders (customer_id, status_doing, status_payment, total, notes)
            VALUES ($1, $2, $3, 0, $4)
            RETURNING id
            "#,
        )
        .bind(input.customer_id)
        .bind(OrderStatusDoing::Pending.as_str())
        .bind(OrderStatusPayment::Unpaid.as_str())
        .bind(&input.notes)
        .fetch_one(&mut *tx)
        .await?;

        let movement_id = ledger::insert_movement(
            &mut tx,
            MovementType::Ordered,
            user_id,
            Some(order_id),
            input.notes.as_deref(),
        )
        .await?;

        let total = self
            .allocate_items(&mut tx, order_id, movement_id, &input.items)
            .await?;

        sqlx::query("UPDATE orders SET total = $2 WHERE id = $1")
            .bind(order_id)
            .bind(total)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(%order_id, %total, "order created");

        self.get_order(order_id).await
    }

    /// Edit a pending unpaid order
    ///
    /// Reverses every reservation of the prior allocation, deletes the
    /// old details, then re-runs FIFO allocation against current stock.
    /// Running the same edit twice therefore converges to the same
    /// ledger state as running it once.
    pub async fn edit_order(
        &self,
        order_id: Uuid,
        input: EditOrderInput,
    ) -> AppResult<OrderResponse> {
        check_items(&input.items)?;

        let mut tx = self.db.begin().await?;

        let order = self.lock_order(&mut tx, order_id).await?;

        if order.status_payment != OrderStatusPayment::Unpaid.as_str()
            || order.status_doing != OrderStatusDoing::Pending.as_str()
        {
            return Err(AppError::InvalidStateTransition(
                "Only pending unpaid orders can be edited".to_string(),
            ));
        }

        let movement_id = self.order_movement(&mut tx, order_id, MovementType::Ordered).await?;

        let old_details = ledger::fetch_movement_details(&mut tx, movement_id).await?;
        for detail in &old_details {
            let op = LedgerOp::Reserve {
                quantity: detail.quantity,
            };
            ledger::apply_deltas(
                &mut tx,
                detail.batch_id,
                &shared::models::reverse_deltas(&op.deltas()),
            )
            .await?;
        }
        ledger::delete_movement_details(&mut tx, movement_id).await?;

        sqlx::query("DELETE FROM order_details WHERE order_id = $1")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        let total = self
            .allocate_items(&mut tx, order_id, movement_id, &input.items)
            .await?;

        sqlx::query("UPDATE orders SET total = $2, updated_at = NOW() WHERE id = $1")
            .bind(order_id)
            .bind(total)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.get_order(order_id).await
    }

    /// Confirm payment: reservations become sales and a Sale is recorded
    pub async fn confirm_order(
        &self,
        user_id: Uuid,
        order_id: Uuid,
        input: ConfirmOrderInput,
    ) -> AppResult<OrderResponse> {
        let mut tx = self.db.begin().await?;

        let order = self.lock_order(&mut tx, order_id).await?;
        let current = parse_payment(&order.status_payment)?;

        // Payments accumulate across confirmations; each one is checked
        // against what is still owed, not the order total.
        let paid_before = sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(amount), 0) FROM sales WHERE order_id = $1",
        )
        .bind(order_id)
        .fetch_one(&mut *tx)
        .await?;

        let (amount, target) =
            plan_payment(order.total, paid_before, input.amount).map_err(|e| {
                AppError::Validation {
                    field: "amount".to_string(),
                    message: e.to_string(),
                    message_es: "El monto debe ser positivo y no mayor al saldo pendiente"
                        .to_string(),
                }
            })?;

        if !payment_transition_allowed(current, target) {
            return Err(AppError::InvalidStateTransition(format!(
                "Cannot confirm payment on an order in state {}",
                order.status_payment
            )));
        }

        let movement_id = ledger::insert_movement(
            &mut tx,
            MovementType::Sold,
            user_id,
            Some(order_id),
            None,
        )
        .await?;

        // A partial confirmation still moves the full reservation to
        // sold; the outstanding balance is purely a payment matter.
        if current == OrderStatusPayment::Unpaid {
            self.mirror_reservation(&mut tx, order_id, movement_id, |quantity| {
                Some(LedgerOp::ConfirmSale { quantity })
            })
            .await?;
        }

        sqlx::query(
            r#"
            INSERT INTO sales (order_id, payment_method, amount, receipt_image_url)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(order_id)
        .bind(input.payment_method.as_str())
        .bind(amount)
        .bind(&input.receipt_image_url)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE orders SET status_payment = $2, updated_at = NOW() WHERE id = $1")
            .bind(order_id)
            .bind(target.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(%order_id, status = target.as_str(), "order payment confirmed");

        self.get_order(order_id).await
    }

    /// Mark the order ready to deliver (audit movement, no deltas)
    pub async fn set_ready(&self, user_id: Uuid, order_id: Uuid) -> AppResult<OrderResponse> {
        self.advance_doing(user_id, order_id, OrderStatusDoing::ReadyToDeliver).await
    }

    /// Mark the order delivered (audit movement, no deltas)
    pub async fn set_delivered(&self, user_id: Uuid, order_id: Uuid) -> AppResult<OrderResponse> {
        self.advance_doing(user_id, order_id, OrderStatusDoing::Delivered).await
    }

    /// Cancel an order, restoring stock to the market counters
    ///
    /// Paid orders restore from sold, unpaid ones from reserved;
    /// delivered orders can no longer be cancelled.
    pub async fn cancel_order(
        &self,
        user_id: Uuid,
        order_id: Uuid,
        input: CancelOrderInput,
    ) -> AppResult<OrderResponse> {
        let mut tx = self.db.begin().await?;

        let order = self.lock_order(&mut tx, order_id).await?;
        let payment = parse_payment(&order.status_payment)?;
        let doing = parse_doing(&order.status_doing)?;

        if !cancellation_allowed(doing, payment) {
            return Err(AppError::InvalidStateTransition(format!(
                "Cannot cancel an order in state {}/{}",
                order.status_doing, order.status_payment
            )));
        }

        let movement_id = ledger::insert_movement(
            &mut tx,
            MovementType::Canceled,
            user_id,
            Some(order_id),
            None,
        )
        .await?;

        let restores_sold = payment.cancellation_restores_sold();
        self.mirror_reservation(&mut tx, order_id, movement_id, |quantity| {
            Some(if restores_sold {
                LedgerOp::CancelSold { quantity }
            } else {
                LedgerOp::CancelReserved { quantity }
            })
        })
        .await?;

        sqlx::query(
            r#"
            UPDATE orders
            SET status_payment = $2, cancel_reason = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(order_id)
        .bind(OrderStatusPayment::Canceled.as_str())
        .bind(input.reason.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(%order_id, reason = input.reason.as_str(), "order cancelled");

        self.get_order(order_id).await
    }

    /// Get an order with its lines and sale record
    pub async fn get_order(&self, order_id: Uuid) -> AppResult<OrderResponse> {
        let order = sqlx::query_as::<_, OrderRecord>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM orders o
            JOIN customers c ON c.id = o.customer_id
            WHERE o.id = $1
            "#,
        ))
        .bind(order_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?;

        let items = sqlx::query_as::<_, OrderDetailRecord>(
            r#"
            SELECT od.product_id, p.name AS product_name, p.code AS product_code,
                   od.quantity, od.unit_price, od.subtotal
            FROM order_details od
            JOIN products p ON p.id = od.product_id
            WHERE od.order_id = $1
            ORDER BY p.code
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.db)
        .await?;

        let sale = sqlx::query_as::<_, SaleRecord>(
            r#"
            SELECT id, payment_method, amount, receipt_image_url, created_at
            FROM sales
            WHERE order_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(OrderResponse { order, items, sale })
    }

    /// List orders, newest first, optionally filtered by payment status
    pub async fn list_orders(
        &self,
        status_payment: Option<OrderStatusPayment>,
    ) -> AppResult<Vec<OrderRecord>> {
        let orders = sqlx::query_as::<_, OrderRecord>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM orders o
            JOIN customers c ON c.id = o.customer_id
            WHERE $1::text IS NULL OR o.status_payment = $1
            ORDER BY o.created_at DESC
            "#,
        ))
        .bind(status_payment.map(|s| s.as_str()))
        .fetch_all(&self.db)
        .await?;

        Ok(orders)
    }

    /// Run FIFO allocation for every requested line, writing movement
    /// details, reservation deltas, and order detail rows. Returns the
    /// order total.
    async fn allocate_items(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        order_id: Uuid,
        movement_id: Uuid,
        items: &[OrderItemInput],
    ) -> AppResult<Decimal> {
        let mut total = Decimal::ZERO;

        for item in items {
            let (name, unit_price) = sqlx::query_as::<_, (String, Decimal)>(
                "SELECT name, unit_price FROM products WHERE id = $1",
            )
            .bind(item.product_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

            // Oldest batches first; the lock keeps concurrent orders
            // from double-reserving the same stock.
            let candidates = sqlx::query_as::<_, CandidateBatchRow>(
                r#"
                SELECT id, market_quantity
                FROM batches
                WHERE product_id = $1 AND market_quantity > 0
                ORDER BY created_at ASC
                FOR UPDATE
                "#,
            )
            .bind(item.product_id)
            .fetch_all(&mut **tx)
            .await?;

            let stocks: Vec<BatchStock> = candidates
                .iter()
                .map(|b| BatchStock {
                    batch_id: b.id,
                    available: b.market_quantity,
                })
                .collect();

            let lines = plan_fifo_allocation(&stocks, item.quantity).map_err(|e| match e {
                AllocationError::InsufficientStock { requested, available } => {
                    AppError::InsufficientStock(format!(
                        "Product {} has {} units at the market, {} requested",
                        name, available, requested
                    ))
                }
                AllocationError::InvalidQuantity => AppError::ValidationError(
                    "Requested quantity must be positive".to_string(),
                ),
            })?;

            for line in &lines {
                let op = LedgerOp::Reserve {
                    quantity: line.quantity,
                };
                ledger::insert_movement_detail(tx, movement_id, line.batch_id, line.quantity)
                    .await?;
                ledger::apply_deltas(tx, line.batch_id, &op.deltas()).await?;
            }

            let subtotal = unit_price * Decimal::from(item.quantity);
            total += subtotal;

            sqlx::query(
                r#"
                INSERT INTO order_details (order_id, product_id, quantity, unit_price, subtotal)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(order_id)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(unit_price)
            .bind(subtotal)
            .execute(&mut **tx)
            .await?;
        }

        Ok(total)
    }

    /// Advance the fulfilment status, mirroring details as an audit trail
    async fn advance_doing(
        &self,
        user_id: Uuid,
        order_id: Uuid,
        target: OrderStatusDoing,
    ) -> AppResult<OrderResponse> {
        let mut tx = self.db.begin().await?;

        let order = self.lock_order(&mut tx, order_id).await?;
        let doing = parse_doing(&order.status_doing)?;
        let payment = parse_payment(&order.status_payment)?;

        if payment == OrderStatusPayment::Canceled {
            return Err(AppError::InvalidStateTransition(
                "Cancelled orders cannot advance".to_string(),
            ));
        }

        if !doing_transition_allowed(doing, target) {
            return Err(AppError::InvalidStateTransition(format!(
                "Cannot move order from {} to {}",
                order.status_doing,
                target.as_str()
            )));
        }

        let movement_type = match target {
            OrderStatusDoing::ReadyToDeliver => MovementType::ReadyToDeliver,
            OrderStatusDoing::Delivered => MovementType::Delivered,
            OrderStatusDoing::Pending => {
                return Err(AppError::InvalidStateTransition(
                    "Orders cannot return to pending".to_string(),
                ))
            }
        };

        let movement_id =
            ledger::insert_movement(&mut tx, movement_type, user_id, Some(order_id), None).await?;

        // Mirror only, no counter changes
        self.mirror_reservation(&mut tx, order_id, movement_id, |_| None).await?;

        sqlx::query("UPDATE orders SET status_doing = $2, updated_at = NOW() WHERE id = $1")
            .bind(order_id)
            .bind(target.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.get_order(order_id).await
    }

    /// Copy the ORDERED movement's detail rows onto a new movement,
    /// optionally applying a ledger op per detail
    async fn mirror_reservation<F>(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        order_id: Uuid,
        movement_id: Uuid,
        op_for: F,
    ) -> AppResult<()>
    where
        F: Fn(i32) -> Option<LedgerOp>,
    {
        let source = self.order_movement(tx, order_id, MovementType::Ordered).await?;
        let details = ledger::fetch_movement_details(tx, source).await?;

        for detail in &details {
            ledger::insert_movement_detail(tx, movement_id, detail.batch_id, detail.quantity)
                .await?;
            if let Some(op) = op_for(detail.quantity) {
                ledger::apply_deltas(tx, detail.batch_id, &op.deltas()).await?;
            }
        }

        Ok(())
    }

    /// Find the order's movement of a given type (its allocation record)
    async fn order_movement(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        order_id: Uuid,
        movement_type: MovementType,
    ) -> AppResult<Uuid> {
        sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id FROM movements
            WHERE order_id = $1 AND movement_type = $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(order_id)
        .bind(movement_type.as_str())
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Order movement".to_string()))
    }

    async fn lock_order(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        order_id: Uuid,
    ) -> AppResult<OrderStateRow> {
        sqlx::query_as::<_, OrderStateRow>(
            r#"
            SELECT status_doing, status_payment, total
            FROM orders
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(order_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))
    }
}

fn parse_payment(value: &str) -> AppResult<OrderStatusPayment> {
    OrderStatusPayment::from_str(value)
        .ok_or_else(|| AppError::Internal(format!("Unknown payment status: {}", value)))
}

fn parse_doing(value: &str) -> AppResult<OrderStatusDoing> {
    OrderStatusDoing::from_str(value)
        .ok_or_else(|| AppError::Internal(format!("Unknown order status: {}", value)))
}
