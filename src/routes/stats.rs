//! Overview statistics route.

use axum::{extract::State, Json};

use crate::errors::{ApiResponse, AppError};
use crate::middleware::auth::CurrentUser;
use crate::services::stats::{self as stats_service, DashboardStats};
use crate::AppState;

/// GET /api/v1/stats
pub async fn get_stats(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<ApiResponse<DashboardStats>>, AppError> {
    let stats = stats_service::get_stats(&state.db).await?;
    Ok(ApiResponse::success(stats))
}
