//! C6 — Compliance Status Computation. Pure aggregation over a
//! vehicle's policies and permits as of a point in time; the
//! repository layer fetches the rows, this module decides what they
//! mean (spec section 4.6).

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::lifecycle::ActiveWindow;
use crate::models::{Permit, Policy, Tenant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    Compliant,
    AtRisk,
    NonCompliant,
}

/// A policy or permit active at `as_of` whose `end_date` falls within
/// the risk window (spec section 4.6's `expiring[]`).
#[derive(Debug, Clone, Serialize)]
pub struct ExpiringRecord {
    pub entity_kind: &'static str,
    pub entity_id: Uuid,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct VehicleCompliance {
    pub status: ComplianceStatus,
    pub insurance_in_force: bool,
    pub missing_permit_types: Vec<String>,
    pub issues: Vec<String>,
    pub expiring: Vec<ExpiringRecord>,
}

/// `is_active_at(as_of)` is necessary but not sufficient for "in
/// force": a future-dated activation (start_date > today) is active in
/// the lifecycle-window sense but not yet in force for compliance
/// purposes (spec section 4.5's note on the activate guard).
fn in_force_at(start_date: NaiveDate, window: &impl ActiveWindow, as_of: DateTime<Utc>) -> bool {
    window.is_active_at(as_of) && start_date <= as_of.date_naive()
}

/// Computes the compliance status of a single vehicle as of `as_of`,
/// with records due within `risk_window` days flagged `at_risk` (spec
/// section 4.6). Callers default `risk_window` to
/// `tenant.settings.expiry_reminder_days`.
///
/// `policies` and `permits` should already be scoped to the vehicle
/// and tenant; only status/state matters here, not which row wins —
/// any one in-force insurance policy satisfies the insurance leg, and
/// every entry in `tenant.settings.required_permit_types` needs at
/// least one in-force permit of that type.
pub fn compliance_status(
    tenant: &Tenant,
    policies: &[Policy],
    permits: &[Permit],
    as_of: DateTime<Utc>,
    risk_window: i64,
) -> VehicleCompliance {
    let insurance_in_force = policies
        .iter()
        .any(|p| in_force_at(p.start_date, p, as_of));

    let missing_permit_types: Vec<String> = tenant
        .settings
        .required_permit_types
        .iter()
        .filter(|required| {
            !permits
                .iter()
                .any(|perm| perm.permit_type == **required && in_force_at(perm.start_date, perm, as_of))
        })
        .cloned()
        .collect();

    let mut issues = Vec::new();
    if !insurance_in_force {
        issues.push("missing_insurance".to_string());
    }
    for missing in &missing_permit_types {
        issues.push(format!("missing_permit:{missing}"));
    }

    let today = as_of.date_naive();
    let mut expiring = Vec::new();
    for policy in policies {
        if in_force_at(policy.start_date, policy, as_of) && (policy.end_date - today).num_days() <= risk_window {
            expiring.push(ExpiringRecord {
                entity_kind: "policy",
                entity_id: policy.id,
                end_date: policy.end_date,
            });
        }
    }
    for permit in permits {
        if in_force_at(permit.start_date, permit, as_of) && (permit.end_date - today).num_days() <= risk_window {
            expiring.push(ExpiringRecord {
                entity_kind: "permit",
                entity_id: permit.id,
                end_date: permit.end_date,
            });
        }
    }

    let all_required_present = insurance_in_force && missing_permit_types.is_empty();
    let status = if !all_required_present {
        ComplianceStatus::NonCompliant
    } else if !expiring.is_empty() {
        ComplianceStatus::AtRisk
    } else {
        ComplianceStatus::Compliant
    };

    VehicleCompliance {
        status,
        insurance_in_force,
        missing_permit_types,
        issues,
        expiring,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PolicyStatus, TenantSettings, TenantStatus};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn tenant_with_required_permits(types: Vec<&str>) -> Tenant {
        Tenant {
            id: Uuid::new_v4(),
            name: "Acme".into(),
            slug: "acme".into(),
            status: TenantStatus::Active,
            settings: TenantSettings {
                expiry_reminder_days: 30,
                fleet_policies_enabled: false,
                required_permit_types: types.into_iter().map(String::from).collect(),
                extra: serde_json::Map::new(),
            },
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    fn active_policy(vehicle_id: Uuid, start_date: NaiveDate, end_date: NaiveDate, activated_at: DateTime<Utc>) -> Policy {
        Policy {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            policy_number: "POL-1".into(),
            vehicle_id,
            start_date,
            end_date,
            premium_amount: dec!(1_000_000),
            status: PolicyStatus::Active.as_str().to_string(),
            activated_at: Some(activated_at),
            cancelled_at: None,
            cancelled_by: None,
            cancellation_reason: None,
            cancellation_note: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn compliant_when_insurance_active_and_no_required_permits() {
        let tenant = tenant_with_required_permits(vec![]);
        let vehicle_id = Uuid::new_v4();
        let now = Utc::now();
        let start = now.date_naive() - chrono::Duration::days(10);
        let end = now.date_naive() + chrono::Duration::days(355);
        let policy = active_policy(vehicle_id, start, end, now - chrono::Duration::days(10));

        let result = compliance_status(&tenant, &[policy], &[], now, 30);
        assert_eq!(result.status, ComplianceStatus::Compliant);
        assert!(result.expiring.is_empty());
    }

    #[test]
    fn non_compliant_when_no_active_policy() {
        let tenant = tenant_with_required_permits(vec![]);
        let result = compliance_status(&tenant, &[], &[], Utc::now(), 30);
        assert_eq!(result.status, ComplianceStatus::NonCompliant);
        assert!(result.issues.contains(&"missing_insurance".to_string()));
    }

    #[test]
    fn future_dated_activation_is_not_yet_in_force() {
        let tenant = tenant_with_required_permits(vec![]);
        let vehicle_id = Uuid::new_v4();
        let now = Utc::now();
        let start = now.date_naive() + chrono::Duration::days(5);
        let end = start + chrono::Duration::days(365);
        let policy = active_policy(vehicle_id, start, end, now);

        let result = compliance_status(&tenant, &[policy], &[], now, 30);
        assert_eq!(result.status, ComplianceStatus::NonCompliant);
        assert!(!result.insurance_in_force);
    }

    #[test]
    fn missing_required_permit_is_reported_by_type() {
        let tenant = tenant_with_required_permits(vec!["latra_license"]);
        let vehicle_id = Uuid::new_v4();
        let now = Utc::now();
        let start = now.date_naive() - chrono::Duration::days(10);
        let end = now.date_naive() + chrono::Duration::days(355);
        let policy = active_policy(vehicle_id, start, end, now - chrono::Duration::days(10));

        let result = compliance_status(&tenant, &[policy], &[], now, 30);
        assert_eq!(result.status, ComplianceStatus::NonCompliant);
        assert_eq!(result.missing_permit_types, vec!["latra_license".to_string()]);
        assert!(result.issues.contains(&"missing_permit:latra_license".to_string()));
    }

    #[test]
    fn non_compliant_when_both_missing() {
        let tenant = tenant_with_required_permits(vec!["latra_license"]);
        let result = compliance_status(&tenant, &[], &[], Utc::now(), 30);
        assert_eq!(result.status, ComplianceStatus::NonCompliant);
    }

    #[test]
    fn at_risk_when_active_policy_expires_within_risk_window() {
        let tenant = tenant_with_required_permits(vec![]);
        let vehicle_id = Uuid::new_v4();
        let as_of = DateTime::parse_from_rfc3339("2025-06-01T00:00:00Z").unwrap().with_timezone(&Utc);
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 6, 11).unwrap();
        let policy = active_policy(vehicle_id, start, end, start.and_hms_opt(0, 0, 0).unwrap().and_utc());

        let result = compliance_status(&tenant, &[policy], &[], as_of, 30);
        assert_eq!(result.status, ComplianceStatus::AtRisk);
        assert_eq!(result.expiring.len(), 1);
        assert_eq!(result.expiring[0].entity_kind, "policy");
    }

    #[test]
    fn not_at_risk_when_expiry_is_outside_risk_window() {
        let tenant = tenant_with_required_permits(vec![]);
        let vehicle_id = Uuid::new_v4();
        let as_of = DateTime::parse_from_rfc3339("2025-06-01T00:00:00Z").unwrap().with_timezone(&Utc);
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        let policy = active_policy(vehicle_id, start, end, start.and_hms_opt(0, 0, 0).unwrap().and_utc());

        let result = compliance_status(&tenant, &[policy], &[], as_of, 30);
        assert_eq!(result.status, ComplianceStatus::Compliant);
        assert!(result.expiring.is_empty());
    }
}
