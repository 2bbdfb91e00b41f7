//! HTTP handlers for batches, production registration, and discards

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{require_role, CurrentUser};
use crate::services::batch::{
    BatchResponse, BatchService, DiscardInput, EditBatchInput, RegisterProductionInput,
};
use crate::AppState;
use shared::models::Role;

#[derive(Debug, Default, Deserialize)]
pub struct ListBatchesQuery {
    pub product_id: Option<Uuid>,
}

/// Register a production run (DEPOSIT)
pub async fn register_production(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<RegisterProductionInput>,
) -> AppResult<Json<BatchResponse>> {
    require_role(&current_user.0, &[Role::Deposit])?;
    let service = BatchService::new(state.db);
    let batch = service
        .register_production(current_user.0.user_id, input)
        .await?;
    Ok(Json(batch))
}

/// Edit a batch that has no movements yet (DEPOSIT)
pub async fn edit_batch(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(batch_id): Path<Uuid>,
    Json(input): Json<EditBatchInput>,
) -> AppResult<Json<BatchResponse>> {
    require_role(&current_user.0, &[Role::Deposit])?;
    let service = BatchService::new(state.db);
    let batch = service
        .edit_batch(current_user.0.user_id, batch_id, input)
        .await?;
    Ok(Json(batch))
}

/// Discard units from a batch (DEPOSIT)
pub async fn discard(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<DiscardInput>,
) -> AppResult<Json<BatchResponse>> {
    require_role(&current_user.0, &[Role::Deposit])?;
    let service = BatchService::new(state.db);
    let batch = service.discard(current_user.0.user_id, input).await?;
    Ok(Json(batch))
}

/// List batches
pub async fn list_batches(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<ListBatchesQuery>,
) -> AppResult<Json<Vec<BatchResponse>>> {
    let service = BatchService::new(state.db);
    let batches = service.list_batches(query.product_id).await?;
    Ok(Json(batches))
}

/// Get a batch
pub async fn get_batch(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(batch_id): Path<Uuid>,
) -> AppResult<Json<BatchResponse>> {
    let service = BatchService::new(state.db);
    let batch = service.get_batch(batch_id).await?;
    Ok(Json(batch))
}
