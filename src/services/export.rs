//! Unbounded CSV export of a filtered listing.

use std::collections::HashMap;

use chrono::NaiveDate;
use futures::stream::BoxStream;
use futures::StreamExt;

use crate::db::Gateway;
use crate::errors::AppError;
use crate::models::filter::{EntitySpec, ExportColumn, FilterValues};
use crate::models::record::Record;
use crate::services::query_builder::ListingQuery;

/// Flush buffered CSV to the body once it grows past this many bytes.
const CHUNK_BYTES: usize = 16 * 1024;

/// A ready-to-send export.
///
/// `expected_rows` is the count query's result for the same filters; the body
/// yields an error instead of ending cleanly if the database fails mid-way.
pub struct CsvExport {
    pub filename: String,
    pub expected_rows: i64,
    pub body: BoxStream<'static, Result<Vec<u8>, AppError>>,
}

impl std::fmt::Debug for CsvExport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvExport")
            .field("filename", &self.filename)
            .field("expected_rows", &self.expected_rows)
            .finish_non_exhaustive()
    }
}

/// `<entity>_export_<YYYY-MM-DD>.csv`
pub fn export_filename(spec: &EntitySpec, date: NaiveDate) -> String {
    format!("{}_export_{}.csv", spec.name, date.format("%Y-%m-%d"))
}

/// Prepare an export of every row matching `params`, ignoring any page number.
///
/// The count runs eagerly so connection faults surface before the response
/// starts; rows are pulled only as the body is consumed.
pub async fn export<G, R>(
    gateway: G,
    spec: &'static EntitySpec,
    params: &HashMap<String, String>,
    date: NaiveDate,
) -> Result<CsvExport, AppError>
where
    G: Gateway<R>,
    R: Record,
{
    let values = FilterValues::extract(spec, params);
    if let Some(param) = values.missing_required(spec) {
        return Err(AppError::Validation(format!("'{param}' filter is required")));
    }

    let query = ListingQuery::new(spec, &values)?;
    let expected_rows = gateway.count(&query.count()?).await?;
    let statement = query.export()?;

    let body: BoxStream<'static, Result<Vec<u8>, AppError>> = Box::pin(async_stream::try_stream! {
        let mut writer = csv_writer();
        writer
            .write_record(spec.export.iter().map(|c| c.header))
            .map_err(csv_failure)?;

        let mut written: i64 = 0;
        let mut rows = <G as Gateway<R>>::stream(&gateway, &statement);
        while let Some(row) = rows.next().await {
            let row = row.map_err(|e| {
                tracing::error!(entity = spec.name, written, error = %e, "Export aborted");
                e
            })?;
            writer
                .write_record(csv_fields(&row, spec.export))
                .map_err(csv_failure)?;
            written += 1;

            if writer.get_ref().len() >= CHUNK_BYTES {
                yield drain(&mut writer)?;
            }
        }

        let tail = drain(&mut writer)?;
        if !tail.is_empty() {
            yield tail;
        }

        if written != expected_rows {
            tracing::warn!(
                entity = spec.name,
                expected_rows,
                written,
                "Export row count drifted from count query"
            );
        }
        tracing::info!(entity = spec.name, rows = written, "Export complete");
    });

    Ok(CsvExport {
        filename: export_filename(spec, date),
        expected_rows,
        body,
    })
}

fn csv_writer() -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new())
}

fn csv_fields<R: Record>(row: &R, columns: &[ExportColumn]) -> Vec<String> {
    columns
        .iter()
        .map(|c| row.field(c.column).map(|v| v.to_string()).unwrap_or_default())
        .collect()
}

/// Take everything written so far, leaving a fresh writer in its place.
fn drain(writer: &mut csv::Writer<Vec<u8>>) -> Result<Vec<u8>, AppError> {
    std::mem::replace(writer, csv_writer())
        .into_inner()
        .map_err(|e| csv_failure(e.into_error().into()))
}

fn csv_failure(e: csv::Error) -> AppError {
    AppError::Internal(format!("CSV encoding failed: {e}"))
}
