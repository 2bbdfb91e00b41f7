//! HTTP handlers for the movement audit log

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::movement::{
    MovementFilter, MovementRecord, MovementResponse, MovementService,
};
use crate::AppState;
use shared::models::MovementType;
use shared::types::{PaginatedResponse, Pagination};

#[derive(Debug, Default, Deserialize)]
pub struct ListMovementsQuery {
    pub movement_type: Option<MovementType>,
    pub batch_id: Option<Uuid>,
    pub order_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// List movements with filters and pagination
pub async fn list_movements(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<ListMovementsQuery>,
) -> AppResult<Json<PaginatedResponse<MovementRecord>>> {
    let filter = MovementFilter {
        movement_type: query.movement_type,
        batch_id: query.batch_id,
        order_id: query.order_id,
        from: query.from,
        to: query.to,
    };
    let defaults = Pagination::default();
    let pagination = Pagination {
        page: query.page.unwrap_or(defaults.page),
        per_page: query.per_page.unwrap_or(defaults.per_page),
    };

    let service = MovementService::new(state.db);
    let movements = service.list_movements(filter, pagination).await?;
    Ok(Json(movements))
}

/// Get a movement with its detail lines
pub async fn get_movement(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(movement_id): Path<Uuid>,
) -> AppResult<Json<MovementResponse>> {
    let service = MovementService::new(state.db);
    let movement = service.get_movement(movement_id).await?;
    Ok(Json(movement))
}
