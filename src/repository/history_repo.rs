use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::HistoryRecord;

/// "What was this entity as of date D" (spec section 3): the latest
/// snapshot recorded at or before `at`.
pub async fn snapshot_as_of(pool: &PgPool, tenant_id: Uuid, entity_kind: &str, entity_id: Uuid, at: DateTime<Utc>) -> AppResult<Option<HistoryRecord>> {
    let row = sqlx::query_as(
        "SELECT * FROM history_records
          WHERE tenant_id = $1 AND entity_kind = $2 AND entity_id = $3 AND recorded_at <= $4
          ORDER BY recorded_at DESC
          LIMIT 1",
    )
    .bind(tenant_id)
    .bind(entity_kind)
    .bind(entity_id)
    .bind(at)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn list_for_entity(pool: &PgPool, tenant_id: Uuid, entity_kind: &str, entity_id: Uuid) -> AppResult<Vec<HistoryRecord>> {
    let rows = sqlx::query_as(
        "SELECT * FROM history_records
          WHERE tenant_id = $1 AND entity_kind = $2 AND entity_id = $3
          ORDER BY recorded_at",
    )
    .bind(tenant_id)
    .bind(entity_kind)
    .bind(entity_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
