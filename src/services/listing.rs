//! Filtered, paginated listing shared by the users, keys and account views.

use std::collections::HashMap;

use crate::db::Gateway;
use crate::errors::AppError;
use crate::models::filter::{EntitySpec, FilterValues};
use crate::models::pagination::{parse_page, PageResult, PageWindow, PAGE_PARAM};
use crate::models::record::Record;
use crate::services::query_builder::ListingQuery;

/// List one page of `spec` rows for raw request parameters.
///
/// Filters and the page number are read from `params` exactly once; the
/// count and page statements are both derived from that snapshot.
pub async fn list<G, R>(
    gateway: &G,
    spec: &EntitySpec,
    params: &HashMap<String, String>,
) -> Result<PageResult<R>, AppError>
where
    G: Gateway<R>,
    R: Record,
{
    let values = FilterValues::extract(spec, params);
    let requested_page = parse_page(params.get(PAGE_PARAM).map(String::as_str));
    list_page(gateway, spec, &values, requested_page).await
}

/// Count, clamp, then fetch. Either both round trips succeed or the whole
/// request fails.
pub async fn list_page<G, R>(
    gateway: &G,
    spec: &EntitySpec,
    values: &FilterValues,
    requested_page: i64,
) -> Result<PageResult<R>, AppError>
where
    G: Gateway<R>,
    R: Record,
{
    if let Some(param) = values.missing_required(spec) {
        return Err(AppError::Validation(format!("'{param}' filter is required")));
    }

    let query = ListingQuery::new(spec, values)?;

    let total = gateway.count(&query.count()?).await?;
    let window = PageWindow::compute(total, requested_page, spec.page_size);

    let rows = gateway
        .fetch_all(&query.page(window.offset, window.page_size)?)
        .await?;

    tracing::debug!(
        entity = spec.name,
        filters = values.len(),
        total_records = window.total_records,
        current_page = window.current_page,
        rows = rows.len(),
        "Listing served"
    );

    Ok(PageResult::new(rows, window))
}
