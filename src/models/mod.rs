//! Database models, listing specs and DTOs.

pub mod application_user;
pub mod filter;
pub mod pagination;
pub mod record;
pub mod xpert_key;
pub mod xpert_user;
