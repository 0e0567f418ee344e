use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// (vehicle_id, customer_id, from_ts, to_ts NULL-for-current); spec
/// section 3 invariant: at most one row per vehicle has `to_ts IS NULL`.
/// Ownership transfers insert a new row and close the previous one in
/// the same transaction; rows are never updated otherwise.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Ownership {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub vehicle_id: Uuid,
    pub customer_id: Uuid,
    pub from_ts: DateTime<Utc>,
    pub to_ts: Option<DateTime<Utc>>,
}

impl Ownership {
    pub fn is_current(&self) -> bool {
        self.to_ts.is_none()
    }

    pub fn covers(&self, at: DateTime<Utc>) -> bool {
        self.from_ts <= at && self.to_ts.map(|to| at < to).unwrap_or(true)
    }
}
