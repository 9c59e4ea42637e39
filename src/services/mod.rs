//! Business logic services.

pub mod application_user;
pub mod auth;
pub mod export;
pub mod listing;
pub mod lookup;
pub mod query_builder;
pub mod stats;
