//! In-memory gateway for service tests.
//!
//! Evaluates the structured conditions carried by each statement against a
//! fixed row set, so tests exercise the same statements production would send.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use futures::stream::BoxStream;
use futures::StreamExt;

use super::Gateway;
use crate::errors::AppError;
use crate::models::filter::DateRange;
use crate::models::record::{FieldValue, Record};
use crate::services::query_builder::{Condition, Statement};

/// Which call should fail, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
    Count,
    Fetch,
    /// Fail after yielding this many streamed rows.
    StreamAfter(usize),
}

#[derive(Clone)]
pub struct MemoryGateway<R> {
    rows: Arc<Vec<R>>,
    fail_on: Option<FailOn>,
    executed: Arc<Mutex<Vec<Statement>>>,
}

impl<R: Record + Clone> MemoryGateway<R> {
    pub fn new(rows: Vec<R>) -> Self {
        Self {
            rows: Arc::new(rows),
            fail_on: None,
            executed: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(mut self, fail_on: FailOn) -> Self {
        self.fail_on = Some(fail_on);
        self
    }

    /// Statements executed so far, in order.
    pub fn executed(&self) -> Vec<Statement> {
        self.executed.lock().unwrap().clone()
    }

    fn record(&self, statement: &Statement) {
        self.executed.lock().unwrap().push(statement.clone());
    }

    fn matching(&self, statement: &Statement) -> Vec<R> {
        let mut rows: Vec<R> = self
            .rows
            .iter()
            .filter(|row| statement.conditions.iter().all(|c| matches(*row, c)))
            .cloned()
            .collect();

        rows.sort_by(|a, b| {
            statement
                .order_by
                .iter()
                .map(|col| sort_key(a, col).cmp(&sort_key(b, col)))
                .find(|o| o.is_ne())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        match statement.window {
            Some(w) => rows
                .into_iter()
                .skip(w.offset as usize)
                .take(w.limit as usize)
                .collect(),
            None => rows,
        }
    }
}

fn sort_key<R: Record>(row: &R, column: &str) -> String {
    row.field(column).map(|v| v.to_string()).unwrap_or_default()
}

fn matches<R: Record>(row: &R, condition: &Condition) -> bool {
    match condition {
        Condition::Equals { column, value } => {
            matches!(row.field(column), Some(FieldValue::Text(v)) if v == value.as_str())
        }
        Condition::Like { column, needle } => match row.field(column) {
            Some(FieldValue::Text(v)) => v.to_lowercase().contains(&needle.to_lowercase()),
            _ => false,
        },
        Condition::Since { column, range } => match row.field(column) {
            Some(FieldValue::Timestamp(ts)) => {
                let cutoff = match range {
                    DateRange::Today => Utc::now()
                        .date_naive()
                        .and_hms_opt(0, 0, 0)
                        .map(|d| d.and_utc())
                        .unwrap_or_else(Utc::now),
                    other => Utc::now() - Duration::days(other.days()),
                };
                ts >= cutoff
            }
            _ => false,
        },
    }
}

fn injected() -> AppError {
    AppError::Database(sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl<R: Record + Clone> Gateway<R> for MemoryGateway<R> {
    async fn count(&self, statement: &Statement) -> Result<i64, AppError> {
        statement.verify()?;
        self.record(statement);
        if self.fail_on == Some(FailOn::Count) {
            return Err(injected());
        }
        let unbounded = Statement {
            window: None,
            ..statement.clone()
        };
        Ok(self.matching(&unbounded).len() as i64)
    }

    async fn fetch_all(&self, statement: &Statement) -> Result<Vec<R>, AppError> {
        statement.verify()?;
        self.record(statement);
        if self.fail_on == Some(FailOn::Fetch) {
            return Err(injected());
        }
        Ok(self.matching(statement))
    }

    fn stream<'a>(&'a self, statement: &'a Statement) -> BoxStream<'a, Result<R, AppError>> {
        self.record(statement);
        let rows = self.matching(statement);
        let fail_after = match self.fail_on {
            Some(FailOn::StreamAfter(n)) => Some(n),
            _ => None,
        };

        let items: Vec<Result<R, AppError>> = match fail_after {
            Some(n) => rows
                .into_iter()
                .take(n)
                .map(Ok)
                .chain(std::iter::once(Err(injected())))
                .collect(),
            None => rows.into_iter().map(Ok).collect(),
        };
        futures::stream::iter(items).boxed()
    }
}
