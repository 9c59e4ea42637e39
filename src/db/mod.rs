//! Database connection pool and the query gateway used by the listing engine.

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{FromRow, PgPool};

use crate::errors::AppError;
use crate::services::query_builder::{SqlParam, Statement};

#[cfg(test)]
pub mod memory;

/// Create a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Executes rendered listing statements.
///
/// Implementations must reject a statement whose placeholders and parameters
/// disagree instead of sending it.
#[async_trait]
pub trait Gateway<R>: Clone + Send + Sync + 'static {
    /// Run a `SELECT COUNT(*)` statement.
    async fn count(&self, statement: &Statement) -> Result<i64, AppError>;

    /// Run a statement and collect every row.
    async fn fetch_all(&self, statement: &Statement) -> Result<Vec<R>, AppError>;

    /// Run a statement and yield rows as the database produces them.
    fn stream<'a>(&'a self, statement: &'a Statement) -> BoxStream<'a, Result<R, AppError>>;
}

/// Gateway backed by the shared sqlx pool.
#[derive(Debug, Clone)]
pub struct PgGateway {
    pool: PgPool,
}

impl PgGateway {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Bind parameters by their declared type, in statement order.
macro_rules! bind_params {
    ($query:expr, $params:expr) => {{
        let mut query = $query;
        for param in $params {
            query = match param {
                SqlParam::Text(value) => query.bind(value.as_str()),
                SqlParam::Int(value) => query.bind(*value),
            };
        }
        query
    }};
}

#[async_trait]
impl<R> Gateway<R> for PgGateway
where
    R: for<'r> FromRow<'r, PgRow> + Send + Unpin + 'static,
{
    async fn count(&self, statement: &Statement) -> Result<i64, AppError> {
        statement.verify()?;
        let total = bind_params!(
            sqlx::query_scalar::<_, i64>(&statement.sql),
            &statement.params
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    async fn fetch_all(&self, statement: &Statement) -> Result<Vec<R>, AppError> {
        statement.verify()?;
        let rows = bind_params!(sqlx::query_as::<_, R>(&statement.sql), &statement.params)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    fn stream<'a>(&'a self, statement: &'a Statement) -> BoxStream<'a, Result<R, AppError>> {
        if let Err(e) = statement.verify() {
            return futures::stream::once(async move { Err(AppError::from(e)) }).boxed();
        }
        bind_params!(sqlx::query_as::<_, R>(&statement.sql), &statement.params)
            .fetch(&self.pool)
            .map_err(AppError::from)
            .boxed()
    }
}
