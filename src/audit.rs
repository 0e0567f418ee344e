//! C8 — Audit + History. Every mutation that reaches a repository
//! write path produces one `AuditEntry` (append-only, including
//! rejected attempts per spec scenario 2) and, on commit, one
//! `HistoryRecord` snapshot — written in the same database transaction
//! as the mutation itself so the two can never drift apart.

use chrono::Utc;
use serde::Serialize;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{AuditAction, AuditOutcome};

pub struct AuditWrite<'a> {
    pub tenant_id: Uuid,
    pub actor_user_id: Option<Uuid>,
    pub entity_kind: &'a str,
    pub entity_id: Uuid,
    pub action: AuditAction,
    pub outcome: AuditOutcome,
    pub before: Option<serde_json::Value>,
    pub after: Option<serde_json::Value>,
    pub reason: Option<String>,
}

/// Inserts the audit row, and — only for committed mutations — the
/// matching history snapshot, within `tx`. Callers commit `tx`
/// themselves once both inserts (and the actual entity write) have
/// succeeded, so a failure anywhere rolls back the whole triple.
pub async fn record(tx: &mut Transaction<'_, Postgres>, write: AuditWrite<'_>) -> AppResult<()> {
    let now = Utc::now();

    sqlx::query(
        "INSERT INTO audit_entries
            (id, tenant_id, actor_user_id, at_ts, entity_kind, entity_id, action, outcome, before, after, reason)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
    )
    .bind(Uuid::new_v4())
    .bind(write.tenant_id)
    .bind(write.actor_user_id)
    .bind(now)
    .bind(write.entity_kind)
    .bind(write.entity_id)
    .bind(write.action.as_str())
    .bind(write.outcome.as_str())
    .bind(&write.before)
    .bind(&write.after)
    .bind(&write.reason)
    .execute(&mut **tx)
    .await?;

    if matches!(write.outcome, AuditOutcome::Committed) {
        if let Some(snapshot) = &write.after {
            sqlx::query(
                "INSERT INTO history_records (id, tenant_id, entity_kind, entity_id, recorded_at, snapshot)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(Uuid::new_v4())
            .bind(write.tenant_id)
            .bind(write.entity_kind)
            .bind(write.entity_id)
            .bind(now)
            .bind(snapshot)
            .execute(&mut **tx)
            .await?;
        }
    }

    Ok(())
}

pub fn snapshot<T: Serialize>(entity: &T) -> Option<serde_json::Value> {
    serde_json::to_value(entity).ok()
}
