use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Role, User, UserRow};

pub async fn create(
    pool: &PgPool,
    tenant_id: Option<Uuid>,
    email: &str,
    password_hash: &str,
    role: Role,
) -> AppResult<User> {
    if (role == Role::SuperAdmin) != tenant_id.is_none() {
        return Err(AppError::validation(
            "tenant_id",
            "super_admin users must have no tenant; all other roles require one",
        ));
    }

    let row: UserRow = sqlx::query_as(
        "INSERT INTO users (id, email, password_hash, role, tenant_id, status, failed_login_count, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, 'active', 0, now(), now())
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(role.as_str())
    .bind(tenant_id)
    .fetch_one(pool)
    .await?;

    Ok(row.into())
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> AppResult<Option<User>> {
    let row: Option<UserRow> =
        sqlx::query_as("SELECT * FROM users WHERE email = $1 AND deleted_at IS NULL")
            .bind(email)
            .fetch_optional(pool)
            .await?;
    Ok(row.map(Into::into))
}

pub async fn find_by_id(pool: &PgPool, user_id: Uuid) -> AppResult<User> {
    let row: UserRow = sqlx::query_as("SELECT * FROM users WHERE id = $1 AND deleted_at IS NULL")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {user_id}")))?;
    Ok(row.into())
}

pub async fn record_login_attempt(
    pool: &PgPool,
    user_id: Uuid,
    failed_login_count: i32,
    locked_until: Option<chrono::DateTime<Utc>>,
) -> AppResult<()> {
    sqlx::query("UPDATE users SET failed_login_count = $2, locked_until = $3, updated_at = now() WHERE id = $1")
        .bind(user_id)
        .bind(failed_login_count)
        .bind(locked_until)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn clear_login_attempts(pool: &PgPool, user_id: Uuid) -> AppResult<()> {
    sqlx::query("UPDATE users SET failed_login_count = 0, locked_until = NULL, updated_at = now() WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// admin/manager ids within `tx`, for notifications that must land in
/// the same transaction as the mutation they describe (spec section 4.10).
pub async fn notification_recipients(tx: &mut Transaction<'_, Postgres>, tenant_id: Uuid) -> AppResult<Vec<Uuid>> {
    let ids: Vec<Uuid> = sqlx::query_scalar(
        "SELECT id FROM users WHERE tenant_id = $1 AND role IN ('admin', 'manager') AND deleted_at IS NULL",
    )
    .bind(tenant_id)
    .fetch_all(&mut **tx)
    .await?;
    Ok(ids)
}

pub async fn list_for_tenant(pool: &PgPool, tenant_id: Uuid, role_filter: Option<Role>) -> AppResult<Vec<User>> {
    let rows: Vec<UserRow> = match role_filter {
        Some(role) => {
            sqlx::query_as("SELECT * FROM users WHERE tenant_id = $1 AND role = $2 AND deleted_at IS NULL ORDER BY email")
                .bind(tenant_id)
                .bind(role.as_str())
                .fetch_all(pool)
                .await?
        }
        None => {
            sqlx::query_as("SELECT * FROM users WHERE tenant_id = $1 AND deleted_at IS NULL ORDER BY email")
                .bind(tenant_id)
                .fetch_all(pool)
                .await?
        }
    };
    Ok(rows.into_iter().map(Into::into).collect())
}
