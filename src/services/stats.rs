//! Dashboard overview statistics.

use serde::Serialize;
use sqlx::PgPool;

use crate::errors::AppError;

/// How many entries the top-N breakdowns keep.
const TOP_N: i64 = 10;

/// Aggregated numbers for the overview page.
#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub application_user_count: i64,
    pub xpert_user_count: i64,
    pub key_count: i64,
    pub permission_breakdown: Vec<PermissionCount>,
    pub top_programmes: Vec<LabelCount>,
    pub top_menus: Vec<LabelCount>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct PermissionCount {
    pub permission: String,
    pub count: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct LabelCount {
    pub label: String,
    pub count: i64,
}

/// Fetch every statistic concurrently; any failing query fails the whole request.
pub async fn get_stats(pool: &PgPool) -> Result<DashboardStats, AppError> {
    let (
        application_user_count,
        xpert_user_count,
        key_count,
        permission_breakdown,
        top_programmes,
        top_menus,
    ) = tokio::try_join!(
        count_rows(pool, "SELECT COUNT(*) FROM application_users"),
        count_rows(pool, "SELECT COUNT(*) FROM xpert_users"),
        count_rows(pool, "SELECT COUNT(*) FROM xpert_keys"),
        fetch_permission_breakdown(pool),
        fetch_top(pool, "xpert_keys", "bbprog"),
        fetch_top(pool, "xpert_users", "menu"),
    )?;

    Ok(DashboardStats {
        application_user_count,
        xpert_user_count,
        key_count,
        permission_breakdown,
        top_programmes,
        top_menus,
    })
}

async fn count_rows(pool: &PgPool, sql: &'static str) -> Result<i64, AppError> {
    let count = sqlx::query_scalar::<_, i64>(sql).fetch_one(pool).await?;
    Ok(count)
}

async fn fetch_permission_breakdown(pool: &PgPool) -> Result<Vec<PermissionCount>, AppError> {
    let rows = sqlx::query_as::<_, PermissionCount>(
        r#"
        SELECT permission, COUNT(*) AS count
        FROM application_users
        GROUP BY permission
        ORDER BY permission
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

fn top_sql(table: &str, column: &str) -> String {
    format!(
        "SELECT {column} AS label, COUNT(*) AS count FROM {table} \
         WHERE {column} IS NOT NULL AND {column} <> '' \
         GROUP BY {column} ORDER BY count DESC, label ASC LIMIT {TOP_N}"
    )
}

/// Most frequent non-empty values of `column`. Identifiers are compile-time constants.
async fn fetch_top(
    pool: &PgPool,
    table: &'static str,
    column: &'static str,
) -> Result<Vec<LabelCount>, AppError> {
    let rows = sqlx::query_as::<_, LabelCount>(&top_sql(table, column))
        .fetch_all(pool)
        .await?;
    Ok(rows)
}
