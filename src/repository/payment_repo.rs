use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::Payment;

pub async fn record(pool: &PgPool, tenant_id: Uuid, policy_id: Uuid, amount: Decimal, received_at: chrono::DateTime<Utc>) -> AppResult<Payment> {
    let payment: Payment = sqlx::query_as(
        "INSERT INTO payments (id, tenant_id, policy_id, amount, received_at, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, now(), now())
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(tenant_id)
    .bind(policy_id)
    .bind(amount)
    .bind(received_at)
    .fetch_one(pool)
    .await?;
    Ok(payment)
}

/// Verification is its own step (spec section 4.3): a recorded payment
/// doesn't count toward I-POL-3 until a manager/admin verifies it.
pub async fn verify(pool: &PgPool, tenant_id: Uuid, payment_id: Uuid, verified_by: Uuid) -> AppResult<Payment> {
    sqlx::query_as(
        "UPDATE payments SET verified_at = now(), verified_by = $3, updated_at = now()
         WHERE id = $1 AND tenant_id = $2 AND verified_at IS NULL
         RETURNING *",
    )
    .bind(payment_id)
    .bind(tenant_id)
    .bind(verified_by)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("unverified payment {payment_id}")))
}

pub async fn list_for_policy(pool: &PgPool, tenant_id: Uuid, policy_id: Uuid) -> AppResult<Vec<Payment>> {
    let rows = sqlx::query_as(
        "SELECT * FROM payments WHERE tenant_id = $1 AND policy_id = $2 ORDER BY received_at",
    )
    .bind(tenant_id)
    .bind(policy_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
