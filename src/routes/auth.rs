//! Authentication routes: login, registration, refresh, logout and own profile.

use axum::{extract::State, Json};
use serde::Deserialize;
use validator::Validate;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::auth::CurrentUser;
use crate::models::application_user::{
    ApplicationUserSummary, ChangePassword, RegisterAccount, UpdateProfile,
};
use crate::services::auth as auth_service;
use crate::services::auth::TokenPair;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<ApiResponse<TokenPair>>, AppError> {
    let tokens = auth_service::login(
        &state.db,
        &body.username,
        &body.password,
        &state.config.jwt_secret,
        state.config.jwt_access_token_expiry_secs,
        state.config.jwt_refresh_token_expiry_secs,
    )
    .await?;

    Ok(ApiResponse::success(tokens))
}

/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterAccount>,
) -> Result<Json<ApiResponse<ApplicationUserSummary>>, AppError> {
    body.validate()?;
    let user = auth_service::register(&state.db, &body).await?;
    Ok(ApiResponse::success(user.into()))
}

/// POST /api/v1/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> Result<Json<ApiResponse<TokenPair>>, AppError> {
    let tokens = auth_service::refresh_token(
        &state.db,
        &body.refresh_token,
        &state.config.jwt_secret,
        state.config.jwt_access_token_expiry_secs,
        state.config.jwt_refresh_token_expiry_secs,
    )
    .await?;

    Ok(ApiResponse::success(tokens))
}

/// POST /api/v1/auth/logout. Tokens are stateless; the client discards them.
pub async fn logout() -> Json<ApiResponse<&'static str>> {
    ApiResponse::success("Logged out successfully")
}

/// GET /api/v1/auth/me
pub async fn me(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<ApiResponse<ApplicationUserSummary>>, AppError> {
    let user = auth_service::find_user_by_id(&state.db, current_user.id).await?;
    Ok(ApiResponse::success(user.into()))
}

/// PUT /api/v1/auth/me
pub async fn update_me(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(body): Json<UpdateProfile>,
) -> Result<Json<ApiResponse<ApplicationUserSummary>>, AppError> {
    body.validate()?;
    let user = auth_service::update_profile(&state.db, current_user.id, &body).await?;
    Ok(ApiResponse::success(user.into()))
}

/// POST /api/v1/auth/password
pub async fn change_password(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(body): Json<ChangePassword>,
) -> Result<Json<ApiResponse<&'static str>>, AppError> {
    body.validate()?;
    auth_service::change_password(&state.db, current_user.id, &body).await?;
    Ok(ApiResponse::success("Password changed"))
}
