//! Guard-then-effect transitions for the Policy state machine
//! (spec section 4.5). Every function here is pure: it takes the
//! current row plus whatever the caller already looked up (verified
//! payment total, conflict existence, "today"), and returns either the
//! updated row or the specific `AppError` the failing guard names. The
//! repository layer is responsible for persisting the result and the
//! matching AuditEntry/HistoryRecord pair in one transaction.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::policy::{Policy, PolicyCancellationReason, PolicyStatus};

/// activate(entity): allowed from {draft, pending_payment}.
pub fn activate(
    policy: &Policy,
    verified_payment_total: Decimal,
    conflicting_active_exists: bool,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> AppResult<Policy> {
    match policy.status() {
        PolicyStatus::Draft | PolicyStatus::PendingPayment => {}
        other => {
            return Err(AppError::InvalidTransition(format!(
                "cannot activate policy {} from status {}",
                policy.id,
                other.as_str()
            )))
        }
    }

    if !policy.is_fully_paid(verified_payment_total) {
        return Err(AppError::PaymentIncomplete);
    }

    if conflicting_active_exists {
        return Err(AppError::Overlap(format!(
            "vehicle {} already has an active policy",
            policy.vehicle_id
        )));
    }

    if policy.end_date <= today {
        return Err(AppError::InvalidTransition(
            "policy end_date must be after today to activate".into(),
        ));
    }

    let mut activated = policy.clone();
    activated.status = PolicyStatus::Active.as_str().to_string();
    activated.activated_at = Some(now);
    activated.updated_at = now;
    Ok(activated)
}

/// cancel(entity, reason, note): allowed from {draft, pending_payment, active}.
pub fn cancel(
    policy: &Policy,
    actor_user_id: Uuid,
    reason: PolicyCancellationReason,
    note: Option<String>,
    now: DateTime<Utc>,
) -> AppResult<Policy> {
    match policy.status() {
        PolicyStatus::Draft | PolicyStatus::PendingPayment | PolicyStatus::Active => {}
        other => {
            return Err(AppError::InvalidTransition(format!(
                "cannot cancel policy {} from status {}",
                policy.id,
                other.as_str()
            )))
        }
    }

    let mut cancelled = policy.clone();
    cancelled.status = PolicyStatus::Cancelled.as_str().to_string();
    cancelled.cancelled_at = Some(now);
    cancelled.cancelled_by = Some(actor_user_id);
    cancelled.cancellation_reason = Some(reason.as_str().to_string());
    cancelled.cancellation_note = note;
    cancelled.updated_at = now;
    Ok(cancelled)
}

/// expire(entity): allowed only from {active}, guarded by `today > end_date`.
pub fn expire(policy: &Policy, today: NaiveDate, now: DateTime<Utc>) -> AppResult<Policy> {
    if policy.status() != PolicyStatus::Active {
        return Err(AppError::InvalidTransition(format!(
            "cannot expire policy {} from status {}",
            policy.id,
            policy.status().as_str()
        )));
    }
    if today <= policy.end_date {
        return Err(AppError::InvalidTransition(
            "policy end_date has not yet passed".into(),
        ));
    }

    let mut expired = policy.clone();
    expired.status = PolicyStatus::Expired.as_str().to_string();
    expired.updated_at = now;
    Ok(expired)
}

/// edit(entity, patch): allowed only while `is_immutable() == false`.
/// The repository applies the actual field patch; this just gates it.
pub fn ensure_editable(policy: &Policy) -> AppResult<()> {
    if policy.is_immutable() {
        return Err(AppError::Immutable(format!(
            "policy {} is {} and can no longer be edited",
            policy.id,
            policy.status().as_str()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn draft_policy() -> Policy {
        Policy {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            policy_number: "POL-1".into(),
            vehicle_id: Uuid::new_v4(),
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
            premium_amount: dec!(1_000_000),
            status: PolicyStatus::Draft.as_str().to_string(),
            activated_at: None,
            cancelled_at: None,
            cancelled_by: None,
            cancellation_reason: None,
            cancellation_note: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    #[test]
    fn happy_activation() {
        let p = draft_policy();
        let activated = activate(&p, dec!(1_000_000), false, today(), Utc::now()).unwrap();
        assert_eq!(activated.status(), PolicyStatus::Active);
        assert!(activated.activated_at.is_some());
    }

    #[test]
    fn underpayment_blocks_activation() {
        let p = draft_policy();
        let err = activate(&p, dec!(500_000), false, today(), Utc::now()).unwrap_err();
        assert!(matches!(err, AppError::PaymentIncomplete));
    }

    #[test]
    fn overlap_blocks_activation() {
        let p = draft_policy();
        let err = activate(&p, dec!(1_000_000), true, today(), Utc::now()).unwrap_err();
        assert!(matches!(err, AppError::Overlap(_)));
    }

    #[test]
    fn cannot_activate_already_active() {
        let mut p = draft_policy();
        p.status = PolicyStatus::Active.as_str().to_string();
        let err = activate(&p, dec!(1_000_000), false, today(), Utc::now()).unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));
    }

    #[test]
    fn cancel_freezes_and_records_reason() {
        let p = draft_policy();
        let actor = Uuid::new_v4();
        let cancelled = cancel(
            &p,
            actor,
            PolicyCancellationReason::CustomerRequest,
            Some("no longer needed".into()),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(cancelled.status(), PolicyStatus::Cancelled);
        assert_eq!(cancelled.cancelled_by, Some(actor));
        assert!(cancelled.is_immutable());
    }

    #[test]
    fn cancel_twice_is_rejected() {
        let p = draft_policy();
        let cancelled = cancel(
            &p,
            Uuid::new_v4(),
            PolicyCancellationReason::CustomerRequest,
            None,
            Utc::now(),
        )
        .unwrap();
        let err = cancel(
            &cancelled,
            Uuid::new_v4(),
            PolicyCancellationReason::CustomerRequest,
            None,
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));
    }

    #[test]
    fn expire_requires_end_date_passed() {
        let mut p = draft_policy();
        p.status = PolicyStatus::Active.as_str().to_string();
        let err = expire(&p, p.end_date, Utc::now()).unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));

        let expired = expire(&p, p.end_date.succ_opt().unwrap(), Utc::now()).unwrap();
        assert_eq!(expired.status(), PolicyStatus::Expired);
    }

    #[test]
    fn edit_rejected_once_immutable() {
        let mut p = draft_policy();
        assert!(ensure_editable(&p).is_ok());
        p.status = PolicyStatus::Active.as_str().to_string();
        assert!(matches!(ensure_editable(&p), Err(AppError::Immutable(_))));
    }
}
