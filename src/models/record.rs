//! Column access for listed rows, used by CSV export.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Borrowed value of a single column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Timestamp(DateTime<Utc>),
}

impl fmt::Display for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

/// A row returned by a listing query.
pub trait Record: Serialize + Send + Sync + Unpin + 'static {
    /// Value of `column`; `None` for SQL NULL or a column the row doesn't carry.
    fn field(&self, column: &str) -> Option<FieldValue<'_>>;
}

pub(crate) fn text(value: &Option<String>) -> Option<FieldValue<'_>> {
    value.as_deref().map(FieldValue::Text)
}
