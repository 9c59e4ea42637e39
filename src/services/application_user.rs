//! Account administration: create, edit and delete dashboard accounts.

use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::application_user::{
    ApplicationUser, ApplicationUserSummary, Permission, UpdateApplicationUser,
};
use crate::services::auth::hash_password;

/// Input for inserting an account with an already chosen permission.
#[derive(Debug, Clone)]
pub struct NewAccount<'a> {
    pub full_name: &'a str,
    pub user_name: &'a str,
    pub password: &'a str,
    pub permission: Permission,
}

/// Map a unique violation on `user_name` to a 409.
pub(crate) fn username_conflict(e: sqlx::Error) -> AppError {
    match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            AppError::Conflict("Username already exists".to_string())
        }
        _ => AppError::Database(e),
    }
}

/// Insert an account. The first account ever created is always an admin,
/// whatever permission was requested.
pub async fn create(pool: &PgPool, input: &NewAccount<'_>) -> Result<ApplicationUser, AppError> {
    let password_hash = hash_password(input.password)?;

    let user = sqlx::query_as::<_, ApplicationUser>(
        r#"
        INSERT INTO application_users (full_name, user_name, password_hash, permission)
        SELECT $1, $2, $3,
               CASE WHEN EXISTS (SELECT 1 FROM application_users) THEN $4 ELSE 'admin' END
        RETURNING id, full_name, user_name, password_hash, permission, date_assigned
        "#,
    )
    .bind(input.full_name.trim())
    .bind(input.user_name.trim())
    .bind(&password_hash)
    .bind(input.permission.as_str())
    .fetch_one(pool)
    .await
    .map_err(username_conflict)?;

    tracing::info!(
        user_id = %user.id,
        user_name = %user.user_name,
        permission = %user.permission,
        "Account created"
    );
    Ok(user)
}

/// Serializes every change that can remove an administrator.
const ADMIN_GUARD_LOCK: i64 = 0x78_756d_6164;

/// Refuse to take away the admin permission when it is the last one left.
fn ensure_admin_remains(current: &str, keeps_admin: bool, admins: i64) -> Result<(), AppError> {
    if current == Permission::Admin.as_str() && !keeps_admin && admins <= 1 {
        return Err(AppError::Conflict(
            "Cannot remove the last administrator".to_string(),
        ));
    }
    Ok(())
}

/// Take the admin guard lock, then read the target's permission and the admin count.
///
/// The lock is held until the transaction ends, so a concurrent demotion or
/// deletion sees this one's committed result before it counts.
async fn lock_admin_state(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: Uuid,
) -> Result<(String, i64), AppError> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(ADMIN_GUARD_LOCK)
        .execute(&mut **tx)
        .await?;

    let current: String =
        sqlx::query_scalar("SELECT permission FROM application_users WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Account not found".to_string()))?;

    let admins: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM application_users WHERE permission = 'admin'")
            .fetch_one(&mut **tx)
            .await?;

    Ok((current, admins))
}

/// Change an account's full name and permission.
///
/// Demoting the only remaining admin is refused.
pub async fn update(
    pool: &PgPool,
    id: Uuid,
    input: &UpdateApplicationUser,
) -> Result<ApplicationUserSummary, AppError> {
    let mut tx = pool.begin().await?;

    let (current, admins) = lock_admin_state(&mut tx, id).await?;
    ensure_admin_remains(&current, input.permission == Permission::Admin, admins)?;

    let updated = sqlx::query_as::<_, ApplicationUserSummary>(
        r#"
        UPDATE application_users
        SET full_name = $1, permission = $2
        WHERE id = $3
        RETURNING id, full_name, user_name, permission, date_assigned
        "#,
    )
    .bind(input.full_name.trim())
    .bind(input.permission.as_str())
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(updated)
}

/// Delete an account other than the caller's own.
///
/// Deleting the only remaining admin is refused.
pub async fn delete(pool: &PgPool, id: Uuid, acting_user: Uuid) -> Result<(), AppError> {
    if id == acting_user {
        return Err(AppError::Validation(
            "You cannot delete your own account".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    let (current, admins) = lock_admin_state(&mut tx, id).await?;
    ensure_admin_remains(&current, false, admins)?;

    sqlx::query("DELETE FROM application_users WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    tracing::info!(user_id = %id, deleted_by = %acting_user, "Account deleted");
    Ok(())
}
