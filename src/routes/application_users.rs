//! Account administration routes (admin only).

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    response::Response,
    Json,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::rbac::RequireAdmin;
use crate::models::application_user::{
    ApplicationUserSummary, CreateApplicationUser, UpdateApplicationUser, APPLICATION_USERS,
};
use crate::models::pagination::PageResult;
use crate::services::application_user::{self as account_service, NewAccount};
use crate::services::{export as export_service, listing};
use crate::AppState;

/// GET /api/v1/application-users?search=&permission=&date_filter=&p=
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<ApiResponse<PageResult<ApplicationUserSummary>>>, AppError> {
    let page = listing::list(&state.gateway(), &APPLICATION_USERS, &params).await?;
    Ok(ApiResponse::success(page))
}

/// GET /api/v1/application-users/export
pub async fn export(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, AppError> {
    let export = export_service::export::<_, ApplicationUserSummary>(
        state.gateway(),
        &APPLICATION_USERS,
        &params,
        Utc::now().date_naive(),
    )
    .await?;
    Ok(super::csv_response(export))
}

/// POST /api/v1/application-users
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(body): Json<CreateApplicationUser>,
) -> Result<Json<ApiResponse<ApplicationUserSummary>>, AppError> {
    body.validate()?;
    let user = account_service::create(
        &state.db,
        &NewAccount {
            full_name: &body.full_name,
            user_name: &body.user_name,
            password: &body.password,
            permission: body.permission,
        },
    )
    .await?;
    Ok(ApiResponse::success(user.into()))
}

/// PUT /api/v1/application-users/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateApplicationUser>,
) -> Result<Json<ApiResponse<ApplicationUserSummary>>, AppError> {
    body.validate()?;
    let user = account_service::update(&state.db, id, &body).await?;
    Ok(ApiResponse::success(user))
}

/// DELETE /api/v1/application-users/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<&'static str>>, AppError> {
    account_service::delete(&state.db, id, admin.id).await?;
    Ok(ApiResponse::success("Account deleted"))
}
