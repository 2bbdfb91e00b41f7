//! Movement log service: paginated, filterable audit trail

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::MovementType;
use shared::types::{PaginatedResponse, Pagination, PaginationMeta};

/// Movement log service
#[derive(Clone)]
pub struct MovementService {
    db: PgPool,
}

/// Filters for the movement log listing
#[derive(Debug, Default, Deserialize)]
pub struct MovementFilter {
    pub movement_type: Option<MovementType>,
    pub batch_id: Option<Uuid>,
    pub order_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Movement row joined with its user
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct MovementRecord {
    pub id: Uuid,
    pub movement_type: String,
    pub user_id: Uuid,
    pub user_name: String,
    pub order_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Detail line joined with batch and product
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct MovementDetailRecord {
    pub id: Uuid,
    pub batch_id: Uuid,
    pub product_name: String,
    pub product_code: String,
    pub quantity: i32,
}

/// Movement plus its detail lines
#[derive(Debug, Serialize)]
pub struct MovementResponse {
    #[serde(flatten)]
    pub movement: MovementRecord,
    pub details: Vec<MovementDetailRecord>,
}

impl MovementService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List movements, newest first, with filters and pagination
    pub async fn list_movements(
        &self,
        filter: MovementFilter,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<MovementRecord>> {
        let movement_type = filter.movement_type.map(|t| t.as_str());

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(DISTINCT m.id)
            FROM movements m
            LEFT JOIN movement_details md ON md.movement_id = m.id
            WHERE ($1::text IS NULL OR m.movement_type = $1)
              AND ($2::uuid IS NULL OR md.batch_id = $2)
              AND ($3::uuid IS NULL OR m.order_id = $3)
              AND ($4::timestamptz IS NULL OR m.created_at >= $4)
              AND ($5::timestamptz IS NULL OR m.created_at <= $5)
            "#,
        )
        .bind(movement_type)
        .bind(filter.batch_id)
        .bind(filter.order_id)
        .bind(filter.from)
        .bind(filter.to)
        .fetch_one(&self.db)
        .await?;

        let movements = sqlx::query_as::<_, MovementRecord>(
            r#"
            SELECT DISTINCT m.id, m.movement_type, m.user_id, u.name AS user_name,
                   m.order_id, m.notes, m.created_at
            FROM movements m
            JOIN users u ON u.id = m.user_id
            LEFT JOIN movement_details md ON md.movement_id = m.id
            WHERE ($1::text IS NULL OR m.movement_type = $1)
              AND ($2::uuid IS NULL OR md.batch_id = $2)
              AND ($3::uuid IS NULL OR m.order_id = $3)
              AND ($4::timestamptz IS NULL OR m.created_at >= $4)
              AND ($5::timestamptz IS NULL OR m.created_at <= $5)
            ORDER BY m.created_at DESC
            LIMIT $6 OFFSET $7
            "#,
        )
        .bind(movement_type)
        .bind(filter.batch_id)
        .bind(filter.order_id)
        .bind(filter.from)
        .bind(filter.to)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: movements,
            pagination: PaginationMeta::new(&pagination, total as u64),
        })
    }

    /// Get a movement with its detail lines
    pub async fn get_movement(&self, movement_id: Uuid) -> AppResult<MovementResponse> {
        let movement = sqlx::query_as::<_, MovementRecord>(
            r#"
            SELECT m.id, m.movement_type, m.user_id, u.name AS user_name,
                   m.order_id, m.notes, m.created_at
            FROM movements m
            JOIN users u ON u.id = m.user_id
            WHERE m.id = $1
            "#,
        )
        .bind(movement_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Movement".to_string()))?;

        let details = sqlx::query_as::<_, MovementDetailRecord>(
            r#"
            SELECT md.id, md.batch_id, p.name AS product_name, p.code AS product_code, md.quantity
            FROM movement_details md
            JOIN batches b ON b.id = md.batch_id
            JOIN products p ON p.id = b.product_id
            WHERE md.movement_id = $1
            ORDER BY md.created_at
            "#,
        )
        .bind(movement_id)
        .fetch_all(&self.db)
        .await?;

        Ok(MovementResponse { movement, details })
    }
}
