//! HTTP handlers for shipments and receptions

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{require_role, CurrentUser};
use crate::services::shipment::{
    CreateShipmentInput, EditShipmentInput, ReceiveShipmentInput, ShipmentRecord,
    ShipmentResponse, ShipmentService,
};
use crate::AppState;
use shared::models::{Role, ShipmentStatus};

#[derive(Debug, Default, Deserialize)]
pub struct ListShipmentsQuery {
    pub status: Option<ShipmentStatus>,
}

/// Create a shipment or return (DEPOSIT)
pub async fn create_shipment(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateShipmentInput>,
) -> AppResult<Json<ShipmentResponse>> {
    require_role(&current_user.0, &[Role::Deposit])?;
    let service = ShipmentService::new(state.db);
    let shipment = service
        .create_shipment(current_user.0.user_id, input)
        .await?;
    Ok(Json(shipment))
}

/// Edit a pending shipment (DEPOSIT)
pub async fn edit_shipment(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(shipment_id): Path<Uuid>,
    Json(input): Json<EditShipmentInput>,
) -> AppResult<Json<ShipmentResponse>> {
    require_role(&current_user.0, &[Role::Deposit])?;
    let service = ShipmentService::new(state.db);
    let shipment = service.edit_shipment(shipment_id, input).await?;
    Ok(Json(shipment))
}

/// Confirm reception at the market (SELLER)
pub async fn receive_shipment(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(shipment_id): Path<Uuid>,
    Json(input): Json<ReceiveShipmentInput>,
) -> AppResult<Json<ShipmentResponse>> {
    require_role(&current_user.0, &[Role::Seller])?;
    let service = ShipmentService::new(state.db);
    let shipment = service
        .receive_shipment(current_user.0.user_id, shipment_id, input)
        .await?;
    Ok(Json(shipment))
}

/// List shipments
pub async fn list_shipments(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<ListShipmentsQuery>,
) -> AppResult<Json<Vec<ShipmentRecord>>> {
    let service = ShipmentService::new(state.db);
    let shipments = service.list_shipments(query.status).await?;
    Ok(Json(shipments))
}

/// Get a shipment with its items
pub async fn get_shipment(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(shipment_id): Path<Uuid>,
) -> AppResult<Json<ShipmentResponse>> {
    let service = ShipmentService::new(state.db);
    let shipment = service.get_shipment(shipment_id).await?;
    Ok(Json(shipment))
}
