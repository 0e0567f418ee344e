use chrono::Utc;
use serde_json::Value as Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Tenant, TenantRow};

pub async fn create(pool: &PgPool, name: &str, slug: &str) -> AppResult<Tenant> {
    let default_settings: Json = serde_json::to_value(crate::models::TenantSettings::default())
        .map_err(|e| AppError::Internal(format!("serialize default settings: {e}")))?;

    let row: TenantRow = sqlx::query_as(
        "INSERT INTO tenants (id, name, slug, status, settings, created_at, updated_at)
         VALUES ($1, $2, $3, 'active', $4, now(), now())
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(slug)
    .bind(default_settings)
    .fetch_one(pool)
    .await?;

    Ok(row.into())
}

pub async fn find_by_id(pool: &PgPool, tenant_id: Uuid) -> AppResult<Tenant> {
    let row: TenantRow = sqlx::query_as("SELECT * FROM tenants WHERE id = $1 AND deleted_at IS NULL")
        .bind(tenant_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("tenant {tenant_id}")))?;
    Ok(row.into())
}

pub async fn update_settings(pool: &PgPool, tenant_id: Uuid, settings: &crate::models::TenantSettings) -> AppResult<Tenant> {
    let json = serde_json::to_value(settings).map_err(|e| AppError::Internal(format!("serialize settings: {e}")))?;
    let row: TenantRow = sqlx::query_as(
        "UPDATE tenants SET settings = $2, updated_at = $3 WHERE id = $1 AND deleted_at IS NULL RETURNING *",
    )
    .bind(tenant_id)
    .bind(json)
    .bind(Utc::now())
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("tenant {tenant_id}")))?;
    Ok(row.into())
}

pub async fn suspend(pool: &PgPool, tenant_id: Uuid) -> AppResult<Tenant> {
    let row: TenantRow = sqlx::query_as(
        "UPDATE tenants SET status = 'suspended', updated_at = now() WHERE id = $1 AND deleted_at IS NULL RETURNING *",
    )
    .bind(tenant_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("tenant {tenant_id}")))?;
    Ok(row.into())
}
