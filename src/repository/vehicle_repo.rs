use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Ownership, Vehicle};

pub async fn create(
    pool: &PgPool,
    tenant_id: Uuid,
    registration_plate: &str,
    chassis_number: &str,
    engine_number: &str,
    vehicle_type: &str,
    usage_category: Option<&str>,
) -> AppResult<Vehicle> {
    let vehicle: Vehicle = sqlx::query_as(
        "INSERT INTO vehicles
            (id, tenant_id, registration_plate, chassis_number, engine_number, vehicle_type, usage_category, status, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, 'active', now(), now())
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(tenant_id)
    .bind(registration_plate)
    .bind(chassis_number)
    .bind(engine_number)
    .bind(vehicle_type)
    .bind(usage_category)
    .fetch_one(pool)
    .await?;
    Ok(vehicle)
}

pub async fn find_by_id(pool: &PgPool, tenant_id: Uuid, vehicle_id: Uuid) -> AppResult<Vehicle> {
    sqlx::query_as("SELECT * FROM vehicles WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL")
        .bind(vehicle_id)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("vehicle {vehicle_id}")))
}

pub async fn list(pool: &PgPool, tenant_id: Uuid, offset: i64, limit: i64) -> AppResult<Vec<Vehicle>> {
    let rows = sqlx::query_as(
        "SELECT * FROM vehicles WHERE tenant_id = $1 AND deleted_at IS NULL
         ORDER BY registration_plate OFFSET $2 LIMIT $3",
    )
    .bind(tenant_id)
    .bind(offset)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn count(pool: &PgPool, tenant_id: Uuid) -> AppResult<i64> {
    let total: i64 = sqlx::query_scalar("SELECT count(*) FROM vehicles WHERE tenant_id = $1 AND deleted_at IS NULL")
        .bind(tenant_id)
        .fetch_one(pool)
        .await?;
    Ok(total)
}

pub async fn current_owner(pool: &PgPool, tenant_id: Uuid, vehicle_id: Uuid) -> AppResult<Option<Ownership>> {
    let row: Option<Ownership> = sqlx::query_as(
        "SELECT * FROM ownerships WHERE tenant_id = $1 AND vehicle_id = $2 AND to_ts IS NULL",
    )
    .bind(tenant_id)
    .bind(vehicle_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Transfers ownership: closes the current open row (if any) and opens
/// a new one, atomically, preserving the "at most one current owner
/// per vehicle" invariant (spec section 3).
pub async fn transfer_ownership(
    pool: &PgPool,
    tenant_id: Uuid,
    vehicle_id: Uuid,
    new_customer_id: Uuid,
) -> AppResult<Ownership> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;

    sqlx::query(
        "UPDATE ownerships SET to_ts = $3 WHERE tenant_id = $1 AND vehicle_id = $2 AND to_ts IS NULL",
    )
    .bind(tenant_id)
    .bind(vehicle_id)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    let ownership: Ownership = sqlx::query_as(
        "INSERT INTO ownerships (id, tenant_id, vehicle_id, customer_id, from_ts, to_ts)
         VALUES ($1, $2, $3, $4, $5, NULL)
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(tenant_id)
    .bind(vehicle_id)
    .bind(new_customer_id)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(ownership)
}
