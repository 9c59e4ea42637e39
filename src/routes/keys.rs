//! Key assignment listing, export and filter options.

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
use crate::models::xpert_key::{KeyFilterOptions, XpertKey, XPERT_KEYS};
use crate::services::{export as export_service, listing, lookup};
use crate::AppState;

/// GET /api/v1/keys?search=&programme=&sequence=&p=
pub async fn list(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<ApiResponse<PageResult<XpertKey>>>, AppError> {
    let page = listing::list(&state.gateway(), &XPERT_KEYS, &params).await?;
    Ok(ApiResponse::success(page))
}

/// GET /api/v1/keys/export
pub async fn export(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, AppError> {
    let export = export_service::export::<_, XpertKey>(
        state.gateway(),
        &XPERT_KEYS,
        &params,
        Utc::now().date_naive(),
    )
    .await?;
    Ok(super::csv_response(export))
}

/// GET /api/v1/keys/options
pub async fn options(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<ApiResponse<KeyFilterOptions>>, AppError> {
    let options = lookup::key_options(&state.db).await?;
    Ok(ApiResponse::success(options))
}
