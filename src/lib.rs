pub mod config;
pub mod db;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use sqlx::PgPool;

use crate::db::PgGateway;
use crate::models::application_user::APPLICATION_USERS;
use crate::models::filter::{EntitySpec, SpecError};
use crate::models::xpert_key::XPERT_KEYS;
use crate::models::xpert_user::XPERT_USERS;

/// Every listing served by the API.
pub static ENTITIES: [&EntitySpec; 3] = [&XPERT_USERS, &XPERT_KEYS, &APPLICATION_USERS];

/// Shared application state passed to all Axum handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: config::AppConfig,
}

impl AppState {
    /// Listing gateway over the shared pool.
    pub fn gateway(&self) -> PgGateway {
        PgGateway::new(self.db.clone())
    }
}

/// Check every listing declaration; run once before serving.
pub fn validate_specs() -> Result<(), SpecError> {
    ENTITIES.iter().try_for_each(|spec| spec.validate())
}
