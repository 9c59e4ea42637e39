//! Xpert user listing, export and menu choices.

use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    response::Response,
    Json,
};
use chrono::Utc;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::auth::CurrentUser;
use crate::models::pagination::PageResult;
use crate::models::xpert_user::{XpertUser, XPERT_USERS};
use crate::services::{export as export_service, listing, lookup};
use crate::AppState;

/// GET /api/v1/users?search=&menu=&p=
pub async fn list(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<ApiResponse<PageResult<XpertUser>>>, AppError> {
    let page = listing::list(&state.gateway(), &XPERT_USERS, &params).await?;
    Ok(ApiResponse::success(page))
}

/// GET /api/v1/users/export?search=&menu=
pub async fn export(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, AppError> {
    let export = export_service::export::<_, XpertUser>(
        state.gateway(),
        &XPERT_USERS,
        &params,
        Utc::now().date_naive(),
    )
    .await?;
    Ok(super::csv_response(export))
}

/// GET /api/v1/users/menus
pub async fn menus(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<ApiResponse<Vec<String>>>, AppError> {
    let menus = lookup::distinct_values(&state.db, &XPERT_USERS, "menu").await?;
    Ok(ApiResponse::success(menus))
}
