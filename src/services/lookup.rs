//! Distinct values that populate the listing filter dropdowns.

use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::filter::{EntitySpec, SpecError};
use crate::models::xpert_key::{KeyFilterOptions, XPERT_KEYS};

fn distinct_sql(spec: &EntitySpec, param: &'static str) -> Result<String, SpecError> {
    let field = spec.filter(param).ok_or(SpecError::UnknownFilter {
        entity: spec.name,
        param,
    })?;
    let column = field.column;
    Ok(format!(
        "SELECT DISTINCT {column} FROM {table} \
         WHERE {column} IS NOT NULL AND {column} <> '' ORDER BY {column}",
        table = spec.table
    ))
}

/// Sorted, non-empty values of the column behind filter `param`.
pub async fn distinct_values(
    pool: &PgPool,
    spec: &EntitySpec,
    param: &'static str,
) -> Result<Vec<String>, AppError> {
    let sql = distinct_sql(spec, param)?;
    let values = sqlx::query_scalar::<_, String>(&sql).fetch_all(pool).await?;
    Ok(values)
}

/// Programme and sequence choices for the keys listing.
pub async fn key_options(pool: &PgPool) -> Result<KeyFilterOptions, AppError> {
    let (programmes, sequences) = tokio::try_join!(
        distinct_values(pool, &XPERT_KEYS, "programme"),
        distinct_values(pool, &XPERT_KEYS, "sequence"),
    )?;
    Ok(KeyFilterOptions {
        programmes,
        sequences,
    })
}
