//! C10 — Notification buffer. The core only enqueues rows; delivery
//! (email/SMS/push) is an external adapter's job (spec section 4.10).
//! Recipient resolution is role-based: managers and admins of the
//! owning tenant, plus any agent directly assigned to the entity.

use serde_json::json;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{NotificationKind, NotificationPriority};

pub struct NotificationDraft {
    pub tenant_id: Uuid,
    pub recipient_user_id: Uuid,
    pub kind: NotificationKind,
    pub priority: NotificationPriority,
    pub payload: serde_json::Value,
}

pub fn cancellation_notice(
    tenant_id: Uuid,
    recipient_user_id: Uuid,
    entity_kind: &str,
    entity_id: Uuid,
    reason: &str,
) -> NotificationDraft {
    NotificationDraft {
        tenant_id,
        recipient_user_id,
        kind: if entity_kind == "permit" {
            NotificationKind::PermitCancelled
        } else {
            NotificationKind::PolicyCancelled
        },
        priority: NotificationPriority::Normal,
        payload: json!({ "entity_kind": entity_kind, "entity_id": entity_id, "reason": reason }),
    }
}

pub fn expiry_reminder(
    tenant_id: Uuid,
    recipient_user_id: Uuid,
    entity_kind: &str,
    entity_id: Uuid,
    days_remaining: i64,
) -> NotificationDraft {
    NotificationDraft {
        tenant_id,
        recipient_user_id,
        kind: NotificationKind::ExpiryReminder,
        priority: if days_remaining <= 7 {
            NotificationPriority::High
        } else {
            NotificationPriority::Normal
        },
        payload: json!({
            "entity_kind": entity_kind,
            "entity_id": entity_id,
            "days_remaining": days_remaining,
        }),
    }
}

/// Enqueues a notification inside the caller's transaction. `dedupe_key`
/// is unique per (tenant, recipient, kind, entity_id, day) at the
/// database level (spec section 4.9), so double-enqueueing the same
/// reminder on a retried reconciler pass is a harmless conflict, not a
/// duplicate row — callers should use `ON CONFLICT DO NOTHING` semantics
/// via this helper rather than a plain INSERT.
pub async fn enqueue(
    tx: &mut Transaction<'_, Postgres>,
    draft: NotificationDraft,
    dedupe_key: &str,
) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO notifications
            (id, tenant_id, recipient_user_id, kind, priority, payload, created_at, dedupe_key)
         VALUES ($1, $2, $3, $4, $5, $6, now(), $7)
         ON CONFLICT (dedupe_key) DO NOTHING",
    )
    .bind(Uuid::new_v4())
    .bind(draft.tenant_id)
    .bind(draft.recipient_user_id)
    .bind(draft.kind.as_str())
    .bind(draft.priority.as_str())
    .bind(draft.payload)
    .bind(dedupe_key)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_to_expiry_reminder_is_high_priority() {
        let draft = expiry_reminder(Uuid::new_v4(), Uuid::new_v4(), "policy", Uuid::new_v4(), 3);
        assert!(matches!(draft.priority, NotificationPriority::High));
    }

    #[test]
    fn distant_expiry_reminder_is_normal_priority() {
        let draft = expiry_reminder(Uuid::new_v4(), Uuid::new_v4(), "policy", Uuid::new_v4(), 20);
        assert!(matches!(draft.priority, NotificationPriority::Normal));
    }
}
