//! Reporting service: dashboard metrics and summary queries
//!
//! Read-only aggregations over the ledger tables. Nothing here mutates
//! counters, so queries run outside transactions.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use shared::types::DateRange;

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    db: PgPool,
}

/// Headline numbers for the dashboard
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct DashboardMetrics {
    pub active_products: i64,
    pub total_batches: i64,
    pub deposit_units: i64,
    pub market_units: i64,
    pub reserved_units: i64,
    pub pending_shipments: i64,
    pub pending_orders: i64,
    pub unpaid_total: Decimal,
    pub sales_total: Decimal,
}

/// Stock position of one product summed across its batches
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ProductStockRow {
    pub product_id: Uuid,
    pub code: String,
    pub name: String,
    pub deposit_quantity: i64,
    pub sent_quantity: i64,
    pub market_quantity: i64,
    pub reserved_quantity: i64,
    pub sold_quantity: i64,
    pub discarded_quantity: i64,
    pub discrepancy_quantity: i64,
}

/// Sales aggregated per calendar day
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct SalesByDayRow {
    pub day: NaiveDate,
    pub sales: i64,
    pub total: Decimal,
}

/// Discarded units grouped by reason
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct DiscardSummaryRow {
    pub reason: String,
    pub events: i64,
    pub total_quantity: i64,
}

/// Movement counts grouped by type over a date range
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct MovementCountRow {
    pub movement_type: String,
    pub count: i64,
}

impl ReportingService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Headline dashboard metrics
    pub async fn dashboard(&self) -> AppResult<DashboardMetrics> {
        let metrics = sqlx::query_as::<_, DashboardMetrics>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM products WHERE is_active = true) AS active_products,
                (SELECT COUNT(*) FROM batches) AS total_batches,
                (SELECT COALESCE(SUM(deposit_quantity), 0) FROM batches) AS deposit_units,
                (SELECT COALESCE(SUM(market_quantity), 0) FROM batches) AS market_units,
                (SELECT COALESCE(SUM(reserved_quantity), 0) FROM batches) AS reserved_units,
                (SELECT COUNT(*) FROM shipments WHERE status = 'PENDING') AS pending_shipments,
                (SELECT COUNT(*) FROM orders
                 WHERE status_doing = 'PENDING' AND status_payment <> 'CANCELED') AS pending_orders,
                (SELECT COALESCE(SUM(o.total), 0) FROM orders o
                 WHERE o.status_payment IN ('UNPAID', 'PARTIAL_PAID')) AS unpaid_total,
                (SELECT COALESCE(SUM(s.amount), 0) FROM sales s
                 JOIN orders o ON o.id = s.order_id
                 WHERE o.status_payment <> 'CANCELED') AS sales_total
            "#,
        )
        .fetch_one(&self.db)
        .await?;

        Ok(metrics)
    }

    /// Per-product stock position across all batches
    pub async fn stock_by_product(&self) -> AppResult<Vec<ProductStockRow>> {
        let rows = sqlx::query_as::<_, ProductStockRow>(
            r#"
            SELECT p.id AS product_id, p.code, p.name,
                   COALESCE(SUM(b.deposit_quantity), 0) AS deposit_quantity,
                   COALESCE(SUM(b.sent_quantity), 0) AS sent_quantity,
                   COALESCE(SUM(b.market_quantity), 0) AS market_quantity,
                   COALESCE(SUM(b.reserved_quantity), 0) AS reserved_quantity,
                   COALESCE(SUM(b.sold_quantity), 0) AS sold_quantity,
                   COALESCE(SUM(b.discarded_quantity), 0) AS discarded_quantity,
                   COALESCE(SUM(b.discrepancy_quantity), 0) AS discrepancy_quantity
            FROM products p
            LEFT JOIN batches b ON b.product_id = p.id
            WHERE p.is_active = true
            GROUP BY p.id, p.code, p.name
            ORDER BY p.code
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Sales per day over a date range
    pub async fn sales_by_day(&self, range: DateRange) -> AppResult<Vec<SalesByDayRow>> {
        let rows = sqlx::query_as::<_, SalesByDayRow>(
            r#"
            SELECT s.created_at::date AS day,
                   COUNT(*) AS sales,
                   COALESCE(SUM(s.amount), 0) AS total
            FROM sales s
            JOIN orders o ON o.id = s.order_id
            WHERE s.created_at::date BETWEEN $1 AND $2
              AND o.status_payment <> 'CANCELED'
            GROUP BY day
            ORDER BY day
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Discarded units grouped by reason
    pub async fn discard_summary(&self) -> AppResult<Vec<DiscardSummaryRow>> {
        let rows = sqlx::query_as::<_, DiscardSummaryRow>(
            r#"
            SELECT reason,
                   COUNT(*) AS events,
                   COALESCE(SUM(quantity), 0) AS total_quantity
            FROM discards
            GROUP BY reason
            ORDER BY total_quantity DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Movement counts by type over a date range
    pub async fn movement_counts(&self, range: DateRange) -> AppResult<Vec<MovementCountRow>> {
        let rows = sqlx::query_as::<_, MovementCountRow>(
            r#"
            SELECT movement_type, COUNT(*) AS count
            FROM movements
            WHERE created_at::date BETWEEN $1 AND $2
            GROUP BY movement_type
            ORDER BY count DESC
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }
}
