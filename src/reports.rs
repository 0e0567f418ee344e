//! C11 — Query/report projections. Tenant-scoped, paginated reads over
//! the domain model; nothing here mutates state (spec section 4.11).

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::compliance::ComplianceStatus;
use crate::error::AppResult;

#[derive(Debug, Clone, Serialize)]
pub struct VehicleComplianceRow {
    pub vehicle_id: Uuid,
    pub registration_plate: String,
    pub status: ComplianceStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

pub struct PageRequest {
    pub page: i64,
    pub page_size: i64,
}

impl PageRequest {
    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1) * self.page_size.max(1)
    }

    pub fn limit(&self) -> i64 {
        self.page_size.clamp(1, 200)
    }
}

/// Tenant-wide compliance summary as of `as_of`, computed per-vehicle
/// the same way `compliance::compliance_status` does, but run as one
/// set-based query against the already-materialized latest status
/// column rather than recomputing per vehicle in-process — the
/// reconciler keeps that column current (spec section 4.9's
/// "reconciler recomputes and persists" contract).
pub async fn tenant_compliance_summary(
    pool: &PgPool,
    tenant_id: Uuid,
    page: PageRequest,
) -> AppResult<Page<VehicleComplianceRow>> {
    let total: i64 = sqlx::query_scalar(
        "SELECT count(*) FROM vehicles WHERE tenant_id = $1 AND deleted_at IS NULL",
    )
    .bind(tenant_id)
    .fetch_one(pool)
    .await?;

    let rows: Vec<(Uuid, String, String)> = sqlx::query_as(
        "SELECT v.id, v.registration_plate, COALESCE(c.status, 'non_compliant')
         FROM vehicles v
         LEFT JOIN vehicle_compliance_cache c ON c.vehicle_id = v.id
         WHERE v.tenant_id = $1 AND v.deleted_at IS NULL
         ORDER BY v.registration_plate
         OFFSET $2 LIMIT $3",
    )
    .bind(tenant_id)
    .bind(page.offset())
    .bind(page.limit())
    .fetch_all(pool)
    .await?;

    let items = rows
        .into_iter()
        .map(|(vehicle_id, registration_plate, status)| VehicleComplianceRow {
            vehicle_id,
            registration_plate,
            status: match status.as_str() {
                "compliant" => ComplianceStatus::Compliant,
                "at_risk" => ComplianceStatus::AtRisk,
                _ => ComplianceStatus::NonCompliant,
            },
        })
        .collect();

    Ok(Page {
        items,
        total,
        page: page.page.max(1),
        page_size: page.limit(),
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct ExpiringEntityRow {
    pub entity_kind: String,
    pub entity_id: Uuid,
    pub end_date: chrono::NaiveDate,
}

/// Policies and permits ending within the tenant's reminder window,
/// used by both the notification-reminder sweep and the "what's coming
/// due" report (spec section 4.9/4.11 share this projection).
pub async fn entities_expiring_within(
    pool: &PgPool,
    tenant_id: Uuid,
    as_of: DateTime<Utc>,
    within_days: i32,
) -> AppResult<Vec<ExpiringEntityRow>> {
    let rows: Vec<(String, Uuid, chrono::NaiveDate)> = sqlx::query_as(
        "SELECT 'policy', id, end_date FROM policies
          WHERE tenant_id = $1 AND status = 'active'
            AND end_date BETWEEN $2::date AND ($2::date + $3)
         UNION ALL
         SELECT 'permit', id, end_date FROM permits
          WHERE tenant_id = $1 AND status = 'active'
            AND end_date BETWEEN $2::date AND ($2::date + $3)
         ORDER BY 3",
    )
    .bind(tenant_id)
    .bind(as_of.date_naive())
    .bind(within_days)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(entity_kind, entity_id, end_date)| ExpiringEntityRow {
            entity_kind,
            entity_id,
            end_date,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_request_computes_offset() {
        let p = PageRequest { page: 3, page_size: 20 };
        assert_eq!(p.offset(), 40);
        assert_eq!(p.limit(), 20);
    }

    #[test]
    fn page_size_is_capped() {
        let p = PageRequest { page: 1, page_size: 10_000 };
        assert_eq!(p.limit(), 200);
    }
}
