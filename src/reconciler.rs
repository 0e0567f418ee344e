//! C9 — Background expiry reconciliation. A single `tokio::spawn`ed
//! interval loop, mirroring the teacher's own long-running worker
//! pattern, that sweeps every tenant's active policies/permits past
//! their `end_date` and expires them, and enqueues reminder
//! notifications for entities approaching theirs. One tick is a single
//! idempotent unit: re-running the same tick after a crash produces no
//! duplicate effects, because every write it performs is either a
//! `status = 'active'` guarded UPDATE or a dedupe-keyed notification
//! insert (spec section 4.9).

use std::time::Duration as StdDuration;

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::audit::{self, AuditWrite};
use crate::compliance;
use crate::error::AppResult;
use crate::lifecycle::{permit_engine, policy_engine};
use crate::models::{AuditAction, AuditOutcome, Permit, Policy, Tenant, TenantRow};
use crate::notifications::{self, NotificationDraft};

pub struct Reconciler {
    pool: PgPool,
    interval: StdDuration,
}

impl Reconciler {
    pub fn new(pool: PgPool, interval_secs: u64) -> Self {
        Self {
            pool,
            interval: StdDuration::from_secs(interval_secs),
        }
    }

    /// Spawns the loop and returns its join handle. Takes `Arc<Self>` so
    /// `main.rs` can hand the same instance to the tenant service for
    /// on-demand `ReconcileNow` runs while the loop keeps ticking.
    pub fn spawn(self: std::sync::Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            loop {
                ticker.tick().await;
                if let Err(err) = self.run_once().await {
                    tracing::error!(error = %err, "reconciler tick failed");
                }
            }
        })
    }

    pub async fn run_once(&self) -> AppResult<()> {
        let now = Utc::now();
        let today = now.date_naive();

        let expired_policies = expire_due_policies(&self.pool, today, now).await?;
        let expired_permits = expire_due_permits(&self.pool, today, now).await?;
        tracing::info!(
            expired_policies,
            expired_permits,
            "reconciler tick: expiry sweep complete"
        );

        let reminders_sent = send_expiry_reminders(&self.pool, now).await?;
        tracing::info!(reminders_sent, "reconciler tick: reminder sweep complete");

        let cached_vehicles = refresh_compliance_cache(&self.pool, now).await?;
        tracing::info!(cached_vehicles, "reconciler tick: compliance cache refreshed");

        Ok(())
    }
}

/// Recomputes `vehicle_compliance_cache` for every tenant so
/// `reports::tenant_compliance_summary` can read a materialized column
/// instead of recomputing per request.
async fn refresh_compliance_cache(pool: &PgPool, now: chrono::DateTime<Utc>) -> AppResult<u64> {
    let tenants: Vec<TenantRow> = sqlx::query_as("SELECT * FROM tenants WHERE deleted_at IS NULL")
        .fetch_all(pool)
        .await?;

    let mut count = 0u64;
    for row in tenants {
        let tenant: Tenant = row.into();
        let vehicle_ids: Vec<Uuid> =
            sqlx::query_scalar("SELECT id FROM vehicles WHERE tenant_id = $1 AND deleted_at IS NULL")
                .bind(tenant.id)
                .fetch_all(pool)
                .await?;

        for vehicle_id in vehicle_ids {
            let policies: Vec<Policy> = sqlx::query_as(
                "SELECT * FROM policies WHERE tenant_id = $1 AND vehicle_id = $2 AND deleted_at IS NULL",
            )
            .bind(tenant.id)
            .bind(vehicle_id)
            .fetch_all(pool)
            .await?;
            let permits: Vec<Permit> = sqlx::query_as(
                "SELECT * FROM permits WHERE tenant_id = $1 AND vehicle_id = $2 AND deleted_at IS NULL",
            )
            .bind(tenant.id)
            .bind(vehicle_id)
            .fetch_all(pool)
            .await?;

            let result = compliance::compliance_status(
                &tenant,
                &policies,
                &permits,
                now,
                tenant.settings.expiry_reminder_days as i64,
            );
            let status = match result.status {
                compliance::ComplianceStatus::Compliant => "compliant",
                compliance::ComplianceStatus::AtRisk => "at_risk",
                compliance::ComplianceStatus::NonCompliant => "non_compliant",
            };

            sqlx::query(
                "INSERT INTO vehicle_compliance_cache (vehicle_id, tenant_id, status, updated_at)
                 VALUES ($1, $2, $3, $4)
                 ON CONFLICT (vehicle_id) DO UPDATE SET status = excluded.status, updated_at = excluded.updated_at",
            )
            .bind(vehicle_id)
            .bind(tenant.id)
            .bind(status)
            .bind(now)
            .execute(pool)
            .await?;
            count += 1;
        }
    }
    Ok(count)
}

async fn expire_due_policies(pool: &PgPool, today: chrono::NaiveDate, now: chrono::DateTime<Utc>) -> AppResult<u64> {
    let due: Vec<Policy> = sqlx::query_as(
        "SELECT * FROM policies WHERE status = 'active' AND end_date < $1 FOR UPDATE SKIP LOCKED",
    )
    .bind(today)
    .fetch_all(pool)
    .await?;

    let mut count = 0u64;
    for policy in due {
        let expired = match policy_engine::expire(&policy, today, now) {
            Ok(expired) => expired,
            Err(err) => {
                tracing::warn!(policy_id = %policy.id, error = %err, "skipping policy expiry");
                continue;
            }
        };

        let mut tx = pool.begin().await?;
        let updated = sqlx::query(
            "UPDATE policies SET status = 'expired', updated_at = $2
             WHERE id = $1 AND status = 'active'",
        )
        .bind(policy.id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 1 {
            audit::record(
                &mut tx,
                AuditWrite {
                    tenant_id: policy.tenant_id,
                    actor_user_id: None,
                    entity_kind: "policy",
                    entity_id: policy.id,
                    action: AuditAction::Transition,
                    outcome: AuditOutcome::Committed,
                    before: audit::snapshot(&policy),
                    after: audit::snapshot(&expired),
                    reason: Some("reconciler_expiry".into()),
                },
            )
            .await?;
            tx.commit().await?;
            count += 1;
        } else {
            tx.rollback().await?;
        }
    }
    Ok(count)
}

async fn expire_due_permits(pool: &PgPool, today: chrono::NaiveDate, now: chrono::DateTime<Utc>) -> AppResult<u64> {
    let due: Vec<Permit> = sqlx::query_as(
        "SELECT * FROM permits WHERE status = 'active' AND end_date < $1 FOR UPDATE SKIP LOCKED",
    )
    .bind(today)
    .fetch_all(pool)
    .await?;

    let mut count = 0u64;
    for permit in due {
        let expired = match permit_engine::expire(&permit, today, now) {
            Ok(expired) => expired,
            Err(err) => {
                tracing::warn!(permit_id = %permit.id, error = %err, "skipping permit expiry");
                continue;
            }
        };

        let mut tx = pool.begin().await?;
        let updated = sqlx::query(
            "UPDATE permits SET status = 'expired', updated_at = $2
             WHERE id = $1 AND status = 'active'",
        )
        .bind(permit.id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 1 {
            audit::record(
                &mut tx,
                AuditWrite {
                    tenant_id: permit.tenant_id,
                    actor_user_id: None,
                    entity_kind: "permit",
                    entity_id: permit.id,
                    action: AuditAction::Transition,
                    outcome: AuditOutcome::Committed,
                    before: audit::snapshot(&permit),
                    after: audit::snapshot(&expired),
                    reason: Some("reconciler_expiry".into()),
                },
            )
            .await?;
            tx.commit().await?;
            count += 1;
        } else {
            tx.rollback().await?;
        }
    }
    Ok(count)
}

/// Enqueues one reminder per (tenant, entity, day) using each tenant's
/// own `expiry_reminder_days` setting; the dedupe key includes the
/// calendar day so a tick that runs twice the same day is a no-op, but
/// tomorrow's tick still sends a fresh reminder if the entity is still
/// unresolved.
async fn send_expiry_reminders(pool: &PgPool, now: chrono::DateTime<Utc>) -> AppResult<u64> {
    let candidates: Vec<(Uuid, Uuid, String, Uuid, chrono::NaiveDate, Option<i32>)> = sqlx::query_as(
        "SELECT t.id, e.entity_id, e.entity_kind, u.id, e.end_date, t.reminder_days
         FROM (
            SELECT tenant_id, id AS entity_id, 'policy' AS entity_kind, end_date FROM policies WHERE status = 'active'
            UNION ALL
            SELECT tenant_id, id AS entity_id, 'permit' AS entity_kind, end_date FROM permits WHERE status = 'active'
         ) e
         JOIN (SELECT id, (settings->>'expiry_reminder_days')::int AS reminder_days FROM tenants) t
           ON t.id = e.tenant_id
         JOIN users u ON u.tenant_id = e.tenant_id AND u.role IN ('admin', 'manager') AND u.deleted_at IS NULL
         WHERE e.end_date - $1::date <= COALESCE(t.reminder_days, 30) AND e.end_date >= $1::date",
    )
    .bind(now.date_naive())
    .fetch_all(pool)
    .await
    .unwrap_or_default();

    let mut count = 0u64;
    for (tenant_id, entity_id, entity_kind, recipient_user_id, end_date, _reminder_days) in candidates {
        let days_remaining = (end_date - now.date_naive()).num_days();
        let draft: NotificationDraft =
            notifications::expiry_reminder(tenant_id, recipient_user_id, &entity_kind, entity_id, days_remaining);
        let dedupe_key = format!(
            "expiry_reminder:{tenant_id}:{recipient_user_id}:{entity_kind}:{entity_id}:{}",
            now.date_naive()
        );

        let mut tx = pool.begin().await?;
        notifications::enqueue(&mut tx, draft, &dedupe_key).await?;
        tx.commit().await?;
        count += 1;
    }
    Ok(count)
}
