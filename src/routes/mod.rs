//! Route definitions for the dashboard API.

pub mod application_users;
pub mod auth;
pub mod health;
pub mod keys;
pub mod stats;
pub mod users;

use axum::{
    body::Body,
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method,
    },
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::services::export::CsvExport;
use crate::AppState;

/// Header carrying the count-query result of an export.
pub const EXPORT_ROW_COUNT: HeaderName = HeaderName::from_static("x-export-row-count");

const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me).put(auth::update_me))
        .route("/auth/password", post(auth::change_password))
        .route("/users", get(users::list))
        .route("/users/export", get(users::export))
        .route("/users/menus", get(users::menus))
        .route("/keys", get(keys::list))
        .route("/keys/export", get(keys::export))
        .route("/keys/options", get(keys::options))
        .route(
            "/application-users",
            get(application_users::list).post(application_users::create),
        )
        .route("/application-users/export", get(application_users::export))
        .route(
            "/application-users/{id}",
            put(application_users::update).delete(application_users::delete),
        )
        .route("/stats", get(stats::get_stats));

    let cors = cors_layer(&state.config.frontend_url);

    Router::new()
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
        .nest("/api/v1", api)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(frontend_url: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, axum::http::header::AUTHORIZATION])
        .expose_headers([CONTENT_DISPOSITION, EXPORT_ROW_COUNT]);

    match frontend_url.parse::<HeaderValue>() {
        Ok(origin) => layer.allow_origin(origin),
        Err(e) => {
            tracing::warn!(frontend_url, error = %e, "Invalid FRONTEND_URL, CORS disabled");
            layer
        }
    }
}

/// Turn a prepared export into a streamed CSV download.
pub(crate) fn csv_response(export: CsvExport) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", export.filename);
    (
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (CONTENT_DISPOSITION, disposition),
            (EXPORT_ROW_COUNT, export.expected_rows.to_string()),
        ],
        Body::from_stream(export.body),
    )
        .into_response()
}
