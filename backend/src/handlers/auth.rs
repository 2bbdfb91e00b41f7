//! HTTP handlers for authentication and user management

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{require_role, CurrentUser};
use crate::services::auth::{
    AuthService, AuthTokens, CreateUserInput, RegisterAdminInput, UserResponse,
};
use crate::AppState;
use shared::models::Role;

#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshInput {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct SetActiveInput {
    pub is_active: bool,
}

/// Create the first administrator account (only while no users exist)
pub async fn register_first_admin(
    State(state): State<AppState>,
    Json(input): Json<RegisterAdminInput>,
) -> AppResult<Json<UserResponse>> {
    let service = AuthService::new(state.db, &state.config);
    let user = service.register_first_admin(input).await?;
    Ok(Json(user))
}

/// Log in with email and password
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> AppResult<Json<AuthTokens>> {
    let service = AuthService::new(state.db, &state.config);
    let tokens = service.login(&input.email, &input.password).await?;
    Ok(Json(tokens))
}

/// Exchange a refresh token for a new token pair
pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshInput>,
) -> AppResult<Json<AuthTokens>> {
    let service = AuthService::new(state.db, &state.config);
    let tokens = service.refresh_token(&input.refresh_token).await?;
    Ok(Json(tokens))
}

/// Create a user account (ADMIN)
pub async fn create_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateUserInput>,
) -> AppResult<Json<UserResponse>> {
    require_role(&current_user.0, &[Role::Admin])?;
    let service = AuthService::new(state.db, &state.config);
    let user = service.create_user(input).await?;
    Ok(Json(user))
}

/// List user accounts (ADMIN)
pub async fn list_users(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<UserResponse>>> {
    require_role(&current_user.0, &[Role::Admin])?;
    let service = AuthService::new(state.db, &state.config);
    let users = service.list_users().await?;
    Ok(Json(users))
}

/// Enable or disable a user account (ADMIN)
pub async fn set_user_active(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(user_id): Path<Uuid>,
    Json(input): Json<SetActiveInput>,
) -> AppResult<Json<UserResponse>> {
    require_role(&current_user.0, &[Role::Admin])?;
    let service = AuthService::new(state.db, &state.config);
    let user = service.set_user_active(user_id, input.is_active).await?;
    Ok(Json(user))
}
