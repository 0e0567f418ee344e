use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// One row per logical mutation, capturing the full entity snapshot
/// after the change — supports "what was the policy at date D"
/// time-travel queries (spec section 3).
#[derive(Debug, Clone, FromRow)]
pub struct HistoryRecord {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub entity_kind: String,
    pub entity_id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub snapshot: serde_json::Value,
}
