//! Guard-then-effect transitions for the Permit state machine (spec
//! section 4.5). Permits skip `pending_payment` entirely: draft moves
//! straight to active, there is no payment guard.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::permit::{Permit, PermitCancellationReason, PermitStatus};

/// activate(entity): allowed only from {draft}.
pub fn activate(
    permit: &Permit,
    conflicting_active_exists: bool,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> AppResult<Permit> {
    if permit.status() != PermitStatus::Draft {
        return Err(AppError::InvalidTransition(format!(
            "cannot activate permit {} from status {}",
            permit.id,
            permit.status().as_str()
        )));
    }

    if conflicting_active_exists {
        return Err(AppError::Overlap(format!(
            "vehicle {} already has an active permit of this type",
            permit.vehicle_id
        )));
    }

    if permit.end_date <= today {
        return Err(AppError::InvalidTransition(
            "permit end_date must be after today to activate".into(),
        ));
    }

    let mut activated = permit.clone();
    activated.status = PermitStatus::Active.as_str().to_string();
    activated.activated_at = Some(now);
    activated.updated_at = now;
    Ok(activated)
}

/// cancel(entity, reason, note): allowed from {draft, active}.
pub fn cancel(
    permit: &Permit,
    actor_user_id: Uuid,
    reason: PermitCancellationReason,
    note: Option<String>,
    now: DateTime<Utc>,
) -> AppResult<Permit> {
    match permit.status() {
        PermitStatus::Draft | PermitStatus::Active => {}
        other => {
            return Err(AppError::InvalidTransition(format!(
                "cannot cancel permit {} from status {}",
                permit.id,
                other.as_str()
            )))
        }
    }

    let mut cancelled = permit.clone();
    cancelled.status = PermitStatus::Cancelled.as_str().to_string();
    cancelled.cancelled_at = Some(now);
    cancelled.cancelled_by = Some(actor_user_id);
    cancelled.cancellation_reason = Some(reason.as_str().to_string());
    cancelled.cancellation_note = note;
    cancelled.updated_at = now;
    Ok(cancelled)
}

/// expire(entity): allowed only from {active}, guarded by `today > end_date`.
pub fn expire(permit: &Permit, today: NaiveDate, now: DateTime<Utc>) -> AppResult<Permit> {
    if permit.status() != PermitStatus::Active {
        return Err(AppError::InvalidTransition(format!(
            "cannot expire permit {} from status {}",
            permit.id,
            permit.status().as_str()
        )));
    }
    if today <= permit.end_date {
        return Err(AppError::InvalidTransition(
            "permit end_date has not yet passed".into(),
        ));
    }

    let mut expired = permit.clone();
    expired.status = PermitStatus::Expired.as_str().to_string();
    expired.updated_at = now;
    Ok(expired)
}

/// edit(entity, patch): allowed only while `is_immutable() == false`.
pub fn ensure_editable(permit: &Permit) -> AppResult<()> {
    if permit.is_immutable() {
        return Err(AppError::Immutable(format!(
            "permit {} is {} and can no longer be edited",
            permit.id,
            permit.status().as_str()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::permit::LATRA_PERMIT_TYPE;
    use chrono::NaiveDate;

    fn draft_permit() -> Permit {
        Permit {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            vehicle_id: Uuid::new_v4(),
            permit_type: LATRA_PERMIT_TYPE.to_string(),
            reference_number: "LATRA-1".into(),
            issuing_authority: "LATRA".into(),
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
            status: PermitStatus::Draft.as_str().to_string(),
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
    fn draft_activates_directly_no_payment_guard() {
        let p = draft_permit();
        let activated = activate(&p, false, today(), Utc::now()).unwrap();
        assert_eq!(activated.status(), PermitStatus::Active);
    }

    #[test]
    fn overlap_blocks_activation() {
        let p = draft_permit();
        let err = activate(&p, true, today(), Utc::now()).unwrap_err();
        assert!(matches!(err, AppError::Overlap(_)));
    }

    #[test]
    fn cancel_from_active_freezes_record() {
        let p = draft_permit();
        let activated = activate(&p, false, today(), Utc::now()).unwrap();
        let cancelled = cancel(
            &activated,
            Uuid::new_v4(),
            PermitCancellationReason::ExpiredEarly,
            None,
            Utc::now(),
        )
        .unwrap();
        assert!(cancelled.is_immutable());
    }

    #[test]
    fn expire_requires_end_date_passed() {
        let mut p = draft_permit();
        p.status = PermitStatus::Active.as_str().to_string();
        assert!(expire(&p, p.end_date, Utc::now()).is_err());
        let expired = expire(&p, p.end_date.succ_opt().unwrap(), Utc::now()).unwrap();
        assert_eq!(expired.status(), PermitStatus::Expired);
    }
}
