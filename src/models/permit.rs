use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::lifecycle::state::ActiveWindow;

/// Permits have no `pending_payment` step: draft -> active directly
/// (spec section 4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermitStatus {
    Draft,
    Active,
    Cancelled,
    Expired,
}

impl PermitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermitStatus::Draft => "draft",
            PermitStatus::Active => "active",
            PermitStatus::Cancelled => "cancelled",
            PermitStatus::Expired => "expired",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(PermitStatus::Draft),
            "active" => Some(PermitStatus::Active),
            "cancelled" => Some(PermitStatus::Cancelled),
            "expired" => Some(PermitStatus::Expired),
            _ => None,
        }
    }
}

/// Cancellation reason enum (Permit) — spec section 6, wire-stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermitCancellationReason {
    CustomerRequest,
    VehicleSold,
    Duplicate,
    DataError,
    ExpiredEarly,
    Other,
}

impl PermitCancellationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermitCancellationReason::CustomerRequest => "customer_request",
            PermitCancellationReason::VehicleSold => "vehicle_sold",
            PermitCancellationReason::Duplicate => "duplicate",
            PermitCancellationReason::DataError => "data_error",
            PermitCancellationReason::ExpiredEarly => "expired_early",
            PermitCancellationReason::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "customer_request" => Some(PermitCancellationReason::CustomerRequest),
            "vehicle_sold" => Some(PermitCancellationReason::VehicleSold),
            "duplicate" => Some(PermitCancellationReason::Duplicate),
            "data_error" => Some(PermitCancellationReason::DataError),
            "expired_early" => Some(PermitCancellationReason::ExpiredEarly),
            "other" => Some(PermitCancellationReason::Other),
            _ => None,
        }
    }
}

/// LATRARecord is modeled as a Permit with this `permit_type`, per spec
/// section 3: "no schema branching on LATRA-specific logic is allowed
/// in the core". Services may expose a LATRA-flavored API, but it is
/// this permit row underneath.
pub const LATRA_PERMIT_TYPE: &str = "latra_license";

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Permit {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub vehicle_id: Uuid,
    pub permit_type: String,
    pub reference_number: String,
    pub issuing_authority: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: String,
    pub activated_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancelled_by: Option<Uuid>,
    pub cancellation_reason: Option<String>,
    pub cancellation_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Permit {
    pub fn status(&self) -> PermitStatus {
        PermitStatus::parse(&self.status).unwrap_or(PermitStatus::Draft)
    }

    pub fn is_immutable(&self) -> bool {
        matches!(
            self.status(),
            PermitStatus::Active | PermitStatus::Cancelled | PermitStatus::Expired
        )
    }

    pub fn is_latra(&self) -> bool {
        self.permit_type == LATRA_PERMIT_TYPE
    }
}

impl ActiveWindow for Permit {
    fn activated_at(&self) -> Option<DateTime<Utc>> {
        self.activated_at
    }

    fn cancelled_at(&self) -> Option<DateTime<Utc>> {
        self.cancelled_at
    }

    fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    fn is_expired_or_cancelled(&self) -> bool {
        matches!(self.status(), PermitStatus::Cancelled | PermitStatus::Expired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(status: PermitStatus) -> Permit {
        Permit {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            vehicle_id: Uuid::new_v4(),
            permit_type: LATRA_PERMIT_TYPE.to_string(),
            reference_number: "LATRA-1".into(),
            issuing_authority: "LATRA".into(),
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
            status: status.as_str().to_string(),
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

    #[test]
    fn draft_is_mutable_active_is_not() {
        assert!(!base(PermitStatus::Draft).is_immutable());
        assert!(base(PermitStatus::Active).is_immutable());
    }

    #[test]
    fn latra_is_a_plain_permit_type() {
        let p = base(PermitStatus::Active);
        assert!(p.is_latra());
        assert_eq!(p.permit_type, "latra_license");
    }
}
