//! HTTP handlers for the customer registry

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{require_role, CurrentUser};
use crate::services::customer::{
    CreateCustomerInput, CustomerRecord, CustomerService, UpdateCustomerInput,
};
use crate::AppState;
use shared::models::Role;

#[derive(Debug, Default, Deserialize)]
pub struct ListCustomersQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

/// Create a customer (SELLER)
pub async fn create_customer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateCustomerInput>,
) -> AppResult<Json<CustomerRecord>> {
    require_role(&current_user.0, &[Role::Seller])?;
    let service = CustomerService::new(state.db);
    let customer = service.create_customer(input).await?;
    Ok(Json(customer))
}

/// Update a customer (SELLER)
pub async fn update_customer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(customer_id): Path<Uuid>,
    Json(input): Json<UpdateCustomerInput>,
) -> AppResult<Json<CustomerRecord>> {
    require_role(&current_user.0, &[Role::Seller])?;
    let service = CustomerService::new(state.db);
    let customer = service.update_customer(customer_id, input).await?;
    Ok(Json(customer))
}

/// Deactivate a customer (SELLER)
pub async fn deactivate_customer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(customer_id): Path<Uuid>,
) -> AppResult<Json<CustomerRecord>> {
    require_role(&current_user.0, &[Role::Seller])?;
    let service = CustomerService::new(state.db);
    let customer = service.deactivate_customer(customer_id).await?;
    Ok(Json(customer))
}

/// List customers
pub async fn list_customers(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<ListCustomersQuery>,
) -> AppResult<Json<Vec<CustomerRecord>>> {
    let service = CustomerService::new(state.db);
    let customers = service.list_customers(query.include_inactive).await?;
    Ok(Json(customers))
}

/// Get a customer
pub async fn get_customer(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(customer_id): Path<Uuid>,
) -> AppResult<Json<CustomerRecord>> {
    let service = CustomerService::new(state.db);
    let customer = service.get_customer(customer_id).await?;
    Ok(Json(customer))
}
