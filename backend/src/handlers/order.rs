//! HTTP handlers for customer orders

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{require_role, CurrentUser};
use crate::services::order::{
    CancelOrderInput, ConfirmOrderInput, CreateOrderInput, EditOrderInput, OrderRecord,
    OrderResponse, OrderService,
};
use crate::AppState;
use shared::models::{OrderStatusPayment, Role};

#[derive(Debug, Default, Deserialize)]
pub struct ListOrdersQuery {
    pub status_payment: Option<OrderStatusPayment>,
}

/// Create an order (SELLER)
pub async fn create_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateOrderInput>,
) -> AppResult<Json<OrderResponse>> {
    require_role(&current_user.0, &[Role::Seller])?;
    let service = OrderService::new(state.db);
    let order = service.create_order(current_user.0.user_id, input).await?;
    Ok(Json(order))
}

/// Edit a pending unpaid order (SELLER)
pub async fn edit_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
    Json(input): Json<EditOrderInput>,
) -> AppResult<Json<OrderResponse>> {
    require_role(&current_user.0, &[Role::Seller])?;
    let service = OrderService::new(state.db);
    let order = service.edit_order(order_id, input).await?;
    Ok(Json(order))
}

/// Confirm payment of an order (SELLER)
pub async fn confirm_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
    Json(input): Json<ConfirmOrderInput>,
) -> AppResult<Json<OrderResponse>> {
    require_role(&current_user.0, &[Role::Seller])?;
    let service = OrderService::new(state.db);
    let order = service
        .confirm_order(current_user.0.user_id, order_id, input)
        .await?;
    Ok(Json(order))
}

/// Mark an order ready to deliver (SELLER)
pub async fn set_ready(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<OrderResponse>> {
    require_role(&current_user.0, &[Role::Seller])?;
    let service = OrderService::new(state.db);
    let order = service.set_ready(current_user.0.user_id, order_id).await?;
    Ok(Json(order))
}

/// Mark an order delivered (SELLER)
pub async fn set_delivered(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<OrderResponse>> {
    require_role(&current_user.0, &[Role::Seller])?;
    let service = OrderService::new(state.db);
    let order = service
        .set_delivered(current_user.0.user_id, order_id)
        .await?;
    Ok(Json(order))
}

/// Cancel an order (SELLER)
pub async fn cancel_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
    Json(input): Json<CancelOrderInput>,
) -> AppResult<Json<OrderResponse>> {
    require_role(&current_user.0, &[Role::Seller])?;
    let service = OrderService::new(state.db);
    let order = service
        .cancel_order(current_user.0.user_id, order_id, input)
        .await?;
    Ok(Json(order))
}

/// List orders
pub async fn list_orders(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<ListOrdersQuery>,
) -> AppResult<Json<Vec<OrderRecord>>> {
    let service = OrderService::new(state.db);
    let orders = service.list_orders(query.status_payment).await?;
    Ok(Json(orders))
}

/// Get an order with its items and sale
pub async fn get_order(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<OrderResponse>> {
    let service = OrderService::new(state.db);
    let order = service.get_order(order_id).await?;
    Ok(Json(order))
}
