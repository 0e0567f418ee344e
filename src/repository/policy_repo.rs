use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::audit::{self, AuditWrite};
use crate::error::{AppError, AppResult};
use crate::lifecycle::policy_engine;
use crate::models::{AuditAction, AuditOutcome, Policy, PolicyCancellationReason};
use crate::notifications;
use crate::repository::user_repo;

/// Name of the partial unique index enforcing I-POL-1 (spec section
/// 4.4): at most one active policy per vehicle at a time. Matched
/// against the constraint name sqlx/postgres reports on conflict so a
/// race loses to the database, not to a check-then-insert gap.
const OVERLAP_CONSTRAINT: &str = "policies_one_active_per_vehicle";

pub async fn create_draft(
    pool: &PgPool,
    tenant_id: Uuid,
    policy_number: &str,
    vehicle_id: Uuid,
    start_date: NaiveDate,
    end_date: NaiveDate,
    premium_amount: Decimal,
) -> AppResult<Policy> {
    let policy: Policy = sqlx::query_as(
        "INSERT INTO policies
            (id, tenant_id, policy_number, vehicle_id, start_date, end_date, premium_amount, status, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, 'draft', now(), now())
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(tenant_id)
    .bind(policy_number)
    .bind(vehicle_id)
    .bind(start_date)
    .bind(end_date)
    .bind(premium_amount)
    .fetch_one(pool)
    .await?;
    Ok(policy)
}

pub async fn find_by_id(pool: &PgPool, tenant_id: Uuid, policy_id: Uuid) -> AppResult<Policy> {
    sqlx::query_as("SELECT * FROM policies WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL")
        .bind(policy_id)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("policy {policy_id}")))
}

pub async fn list_for_vehicle(pool: &PgPool, tenant_id: Uuid, vehicle_id: Uuid) -> AppResult<Vec<Policy>> {
    let rows = sqlx::query_as(
        "SELECT * FROM policies WHERE tenant_id = $1 AND vehicle_id = $2 AND deleted_at IS NULL ORDER BY start_date",
    )
    .bind(tenant_id)
    .bind(vehicle_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

async fn verified_payment_total(pool: &PgPool, tenant_id: Uuid, policy_id: Uuid) -> AppResult<Decimal> {
    let total: Option<Decimal> = sqlx::query_scalar(
        "SELECT sum(amount) FROM payments WHERE tenant_id = $1 AND policy_id = $2 AND verified_at IS NOT NULL",
    )
    .bind(tenant_id)
    .bind(policy_id)
    .fetch_one(pool)
    .await?;
    Ok(total.unwrap_or_default())
}

/// Activates a policy, delegating the transition guards to
/// `lifecycle::policy_engine` and relying on the database's partial
/// unique index to make the overlap check (I-POL-1) race-free: the
/// UPDATE itself is the only thing that can fail on conflict.
pub async fn activate(pool: &PgPool, tenant_id: Uuid, policy_id: Uuid, actor_user_id: Uuid) -> AppResult<Policy> {
    let policy = find_by_id(pool, tenant_id, policy_id).await?;
    let verified_total = verified_payment_total(pool, tenant_id, policy_id).await?;
    let now = Utc::now();

    let transition = match policy_engine::activate(&policy, verified_total, false, now.date_naive(), now) {
        Ok(t) => t,
        Err(err) => {
            let mut tx = pool.begin().await?;
            audit::record(
                &mut tx,
                AuditWrite {
                    tenant_id,
                    actor_user_id: Some(actor_user_id),
                    entity_kind: "policy",
                    entity_id: policy_id,
                    action: AuditAction::Transition,
                    outcome: AuditOutcome::Rejected,
                    before: audit::snapshot(&policy),
                    after: None,
                    reason: Some(err.to_string()),
                },
            )
            .await?;
            tx.commit().await?;
            return Err(err);
        }
    };

    let mut tx = pool.begin().await?;
    let update_result = sqlx::query(
        "UPDATE policies SET status = 'active', activated_at = $2, updated_at = $3
         WHERE id = $1 AND status IN ('draft', 'pending_payment')",
    )
    .bind(policy_id)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await;

    let updated = match update_result {
        Ok(result) if result.rows_affected() == 1 => true,
        Ok(_) => false,
        Err(sqlx::Error::Database(db_err)) if db_err.constraint() == Some(OVERLAP_CONSTRAINT) => {
            tx.rollback().await?;
            let overlap = AppError::Overlap(format!("vehicle {} already has an active policy", policy.vehicle_id));
            let mut tx2 = pool.begin().await?;
            audit::record(
                &mut tx2,
                AuditWrite {
                    tenant_id,
                    actor_user_id: Some(actor_user_id),
                    entity_kind: "policy",
                    entity_id: policy_id,
                    action: AuditAction::Transition,
                    outcome: AuditOutcome::Rejected,
                    before: audit::snapshot(&policy),
                    after: None,
                    reason: Some(overlap.to_string()),
                },
            )
            .await?;
            tx2.commit().await?;
            return Err(overlap);
        }
        Err(other) => return Err(other.into()),
    };

    if !updated {
        tx.rollback().await?;
        return Err(AppError::Conflict(format!("policy {policy_id} changed status concurrently")));
    }

    audit::record(
        &mut tx,
        AuditWrite {
            tenant_id,
            actor_user_id: Some(actor_user_id),
            entity_kind: "policy",
            entity_id: policy_id,
            action: AuditAction::Transition,
            outcome: AuditOutcome::Committed,
            before: audit::snapshot(&policy),
            after: audit::snapshot(&transition),
            reason: None,
        },
    )
    .await?;
    tx.commit().await?;

    Ok(transition)
}

pub async fn cancel(
    pool: &PgPool,
    tenant_id: Uuid,
    policy_id: Uuid,
    actor_user_id: Uuid,
    reason: PolicyCancellationReason,
    note: Option<String>,
) -> AppResult<Policy> {
    let policy = find_by_id(pool, tenant_id, policy_id).await?;
    let now = Utc::now();
    let transition = policy_engine::cancel(&policy, actor_user_id, reason, note, now)?;

    let mut tx = pool.begin().await?;
    sqlx::query(
        "UPDATE policies
            SET status = 'cancelled', cancelled_at = $2, cancelled_by = $3,
                cancellation_reason = $4, cancellation_note = $5, updated_at = $6
          WHERE id = $1",
    )
    .bind(policy_id)
    .bind(now)
    .bind(actor_user_id)
    .bind(reason.as_str())
    .bind(&transition.cancellation_note)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    audit::record(
        &mut tx,
        AuditWrite {
            tenant_id,
            actor_user_id: Some(actor_user_id),
            entity_kind: "policy",
            entity_id: policy_id,
            action: AuditAction::Transition,
            outcome: AuditOutcome::Committed,
            before: audit::snapshot(&policy),
            after: audit::snapshot(&transition),
            reason: Some(reason.as_str().to_string()),
        },
    )
    .await?;

    for recipient_user_id in user_repo::notification_recipients(&mut tx, tenant_id).await? {
        let draft = notifications::cancellation_notice(tenant_id, recipient_user_id, "policy", policy_id, reason.as_str());
        let dedupe_key = format!("cancellation:{tenant_id}:{recipient_user_id}:policy:{policy_id}");
        notifications::enqueue(&mut tx, draft, &dedupe_key).await?;
    }

    tx.commit().await?;

    Ok(transition)
}
