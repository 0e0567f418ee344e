use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Customer, CustomerKind};

pub async fn create(
    pool: &PgPool,
    tenant_id: Uuid,
    kind: CustomerKind,
    display_name: &str,
    contact_email: Option<&str>,
    contact_phone: Option<&str>,
) -> AppResult<Customer> {
    let customer: Customer = sqlx::query_as(
        "INSERT INTO customers (id, tenant_id, kind, display_name, contact_email, contact_phone, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, now(), now())
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(tenant_id)
    .bind(kind.as_str())
    .bind(display_name)
    .bind(contact_email)
    .bind(contact_phone)
    .fetch_one(pool)
    .await?;
    Ok(customer)
}

pub async fn find_by_id(pool: &PgPool, tenant_id: Uuid, customer_id: Uuid) -> AppResult<Customer> {
    sqlx::query_as("SELECT * FROM customers WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL")
        .bind(customer_id)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("customer {customer_id}")))
}

pub async fn list(pool: &PgPool, tenant_id: Uuid, offset: i64, limit: i64) -> AppResult<Vec<Customer>> {
    let rows = sqlx::query_as(
        "SELECT * FROM customers WHERE tenant_id = $1 AND deleted_at IS NULL
         ORDER BY display_name OFFSET $2 LIMIT $3",
    )
    .bind(tenant_id)
    .bind(offset)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn count(pool: &PgPool, tenant_id: Uuid) -> AppResult<i64> {
    let total: i64 = sqlx::query_scalar("SELECT count(*) FROM customers WHERE tenant_id = $1 AND deleted_at IS NULL")
        .bind(tenant_id)
        .fetch_one(pool)
        .await?;
    Ok(total)
}

pub async fn soft_delete(pool: &PgPool, tenant_id: Uuid, customer_id: Uuid) -> AppResult<()> {
    let result = sqlx::query(
        "UPDATE customers SET deleted_at = now(), updated_at = now()
         WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL",
    )
    .bind(customer_id)
    .bind(tenant_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("customer {customer_id}")));
    }
    Ok(())
}
