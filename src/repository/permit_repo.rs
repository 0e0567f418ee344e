use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::audit::{self, AuditWrite};
use crate::error::{AppError, AppResult};
use crate::lifecycle::permit_engine;
use crate::models::{AuditAction, AuditOutcome, Permit, PermitCancellationReason};
use crate::notifications;
use crate::repository::user_repo;

/// I-PERM-1's partial unique index, one per (vehicle_id, permit_type).
const OVERLAP_CONSTRAINT: &str = "permits_one_active_per_vehicle_and_type";

pub async fn create_draft(
    pool: &PgPool,
    tenant_id: Uuid,
    vehicle_id: Uuid,
    permit_type: &str,
    reference_number: &str,
    issuing_authority: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> AppResult<Permit> {
    let permit: Permit = sqlx::query_as(
        "INSERT INTO permits
            (id, tenant_id, vehicle_id, permit_type, reference_number, issuing_authority, start_date, end_date, status, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'draft', now(), now())
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(tenant_id)
    .bind(vehicle_id)
    .bind(permit_type)
    .bind(reference_number)
    .bind(issuing_authority)
    .bind(start_date)
    .bind(end_date)
    .fetch_one(pool)
    .await?;
    Ok(permit)
}

pub async fn find_by_id(pool: &PgPool, tenant_id: Uuid, permit_id: Uuid) -> AppResult<Permit> {
    sqlx::query_as("SELECT * FROM permits WHERE id = $1 AND tenant_id = $2 AND deleted_at IS NULL")
        .bind(permit_id)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("permit {permit_id}")))
}

pub async fn list_for_vehicle(pool: &PgPool, tenant_id: Uuid, vehicle_id: Uuid) -> AppResult<Vec<Permit>> {
    let rows = sqlx::query_as(
        "SELECT * FROM permits WHERE tenant_id = $1 AND vehicle_id = $2 AND deleted_at IS NULL ORDER BY start_date",
    )
    .bind(tenant_id)
    .bind(vehicle_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn activate(pool: &PgPool, tenant_id: Uuid, permit_id: Uuid, actor_user_id: Uuid) -> AppResult<Permit> {
    let permit = find_by_id(pool, tenant_id, permit_id).await?;
    let now = Utc::now();

    let transition = match permit_engine::activate(&permit, false, now.date_naive(), now) {
        Ok(t) => t,
        Err(err) => {
            let mut tx = pool.begin().await?;
            audit::record(
                &mut tx,
                AuditWrite {
                    tenant_id,
                    actor_user_id: Some(actor_user_id),
                    entity_kind: "permit",
                    entity_id: permit_id,
                    action: AuditAction::Transition,
                    outcome: AuditOutcome::Rejected,
                    before: audit::snapshot(&permit),
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
        "UPDATE permits SET status = 'active', activated_at = $2, updated_at = $3
         WHERE id = $1 AND status = 'draft'",
    )
    .bind(permit_id)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await;

    let updated = match update_result {
        Ok(result) if result.rows_affected() == 1 => true,
        Ok(_) => false,
        Err(sqlx::Error::Database(db_err)) if db_err.constraint() == Some(OVERLAP_CONSTRAINT) => {
            tx.rollback().await?;
            let overlap = AppError::Overlap(format!(
                "vehicle {} already has an active permit of type {}",
                permit.vehicle_id, permit.permit_type
            ));
            let mut tx2 = pool.begin().await?;
            audit::record(
                &mut tx2,
                AuditWrite {
                    tenant_id,
                    actor_user_id: Some(actor_user_id),
                    entity_kind: "permit",
                    entity_id: permit_id,
                    action: AuditAction::Transition,
                    outcome: AuditOutcome::Rejected,
                    before: audit::snapshot(&permit),
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
        return Err(AppError::Conflict(format!("permit {permit_id} changed status concurrently")));
    }

    audit::record(
        &mut tx,
        AuditWrite {
            tenant_id,
            actor_user_id: Some(actor_user_id),
            entity_kind: "permit",
            entity_id: permit_id,
            action: AuditAction::Transition,
            outcome: AuditOutcome::Committed,
            before: audit::snapshot(&permit),
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
    permit_id: Uuid,
    actor_user_id: Uuid,
    reason: PermitCancellationReason,
    note: Option<String>,
) -> AppResult<Permit> {
    let permit = find_by_id(pool, tenant_id, permit_id).await?;
    let now = Utc::now();
    let transition = permit_engine::cancel(&permit, actor_user_id, reason, note, now)?;

    let mut tx = pool.begin().await?;
    sqlx::query(
        "UPDATE permits
            SET status = 'cancelled', cancelled_at = $2, cancelled_by = $3,
                cancellation_reason = $4, cancellation_note = $5, updated_at = $6
          WHERE id = $1",
    )
    .bind(permit_id)
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
            entity_kind: "permit",
            entity_id: permit_id,
            action: AuditAction::Transition,
            outcome: AuditOutcome::Committed,
            before: audit::snapshot(&permit),
            after: audit::snapshot(&transition),
            reason: Some(reason.as_str().to_string()),
        },
    )
    .await?;

    for recipient_user_id in user_repo::notification_recipients(&mut tx, tenant_id).await? {
        let draft = notifications::cancellation_notice(tenant_id, recipient_user_id, "permit", permit_id, reason.as_str());
        let dedupe_key = format!("cancellation:{tenant_id}:{recipient_user_id}:permit:{permit_id}");
        notifications::enqueue(&mut tx, draft, &dedupe_key).await?;
    }

    tx.commit().await?;

    Ok(transition)
}
