//! HTTP handlers for the product catalog

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{require_role, CurrentUser};
use crate::services::product::{
    CreateProductInput, ProductRecord, ProductService, UpdateProductInput,
};
use crate::AppState;
use shared::models::Role;

#[derive(Debug, Default, Deserialize)]
pub struct ListProductsQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

/// Create a product (ADMIN)
pub async fn create_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateProductInput>,
) -> AppResult<Json<ProductRecord>> {
    require_role(&current_user.0, &[Role::Admin])?;
    let service = ProductService::new(state.db);
    let product = service.create_product(input).await?;
    Ok(Json(product))
}

/// Update a product (ADMIN)
pub async fn update_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
    Json(input): Json<UpdateProductInput>,
) -> AppResult<Json<ProductRecord>> {
    require_role(&current_user.0, &[Role::Admin])?;
    let service = ProductService::new(state.db);
    let product = service.update_product(product_id, input).await?;
    Ok(Json(product))
}

/// Deactivate a product (ADMIN)
pub async fn deactivate_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ProductRecord>> {
    require_role(&current_user.0, &[Role::Admin])?;
    let service = ProductService::new(state.db);
    let product = service.deactivate_product(product_id).await?;
    Ok(Json(product))
}

/// List products
pub async fn list_products(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<ListProductsQuery>,
) -> AppResult<Json<Vec<ProductRecord>>> {
    let service = ProductService::new(state.db);
    let products = service.list_products(query.include_inactive).await?;
    Ok(Json(products))
}

/// Get a product
pub async fn get_product(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ProductRecord>> {
    let service = ProductService::new(state.db);
    let product = service.get_product(product_id).await?;
    Ok(Json(product))
}
