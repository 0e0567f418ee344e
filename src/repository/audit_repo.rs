use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::AuditEntry;

pub async fn list_for_entity(pool: &PgPool, tenant_id: Uuid, entity_kind: &str, entity_id: Uuid) -> AppResult<Vec<AuditEntry>> {
    let rows = sqlx::query_as(
        "SELECT * FROM audit_entries
          WHERE tenant_id = $1 AND entity_kind = $2 AND entity_id = $3
          ORDER BY at_ts",
    )
    .bind(tenant_id)
    .bind(entity_kind)
    .bind(entity_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
