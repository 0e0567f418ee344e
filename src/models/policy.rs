use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::lifecycle::state::ActiveWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyStatus {
    Draft,
    PendingPayment,
    Active,
    Cancelled,
    Expired,
}

impl PolicyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyStatus::Draft => "draft",
            PolicyStatus::PendingPayment => "pending_payment",
            PolicyStatus::Active => "active",
            PolicyStatus::Cancelled => "cancelled",
            PolicyStatus::Expired => "expired",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(PolicyStatus::Draft),
            "pending_payment" => Some(PolicyStatus::PendingPayment),
            "active" => Some(PolicyStatus::Active),
            "cancelled" => Some(PolicyStatus::Cancelled),
            "expired" => Some(PolicyStatus::Expired),
            _ => None,
        }
    }
}

/// Cancellation reason enum (Policy) — spec section 6, wire-stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyCancellationReason {
    CustomerRequest,
    NonPayment,
    VehicleSold,
    Duplicate,
    DataError,
    Other,
}

impl PolicyCancellationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyCancellationReason::CustomerRequest => "customer_request",
            PolicyCancellationReason::NonPayment => "non_payment",
            PolicyCancellationReason::VehicleSold => "vehicle_sold",
            PolicyCancellationReason::Duplicate => "duplicate",
            PolicyCancellationReason::DataError => "data_error",
            PolicyCancellationReason::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "customer_request" => Some(PolicyCancellationReason::CustomerRequest),
            "non_payment" => Some(PolicyCancellationReason::NonPayment),
            "vehicle_sold" => Some(PolicyCancellationReason::VehicleSold),
            "duplicate" => Some(PolicyCancellationReason::Duplicate),
            "data_error" => Some(PolicyCancellationReason::DataError),
            "other" => Some(PolicyCancellationReason::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Policy {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub policy_number: String,
    pub vehicle_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub premium_amount: Decimal,
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

impl Policy {
    pub fn status(&self) -> PolicyStatus {
        PolicyStatus::parse(&self.status).unwrap_or(PolicyStatus::Draft)
    }

    /// I-POL-2: once active/cancelled/expired, only lifecycle-closure
    /// fields may change.
    pub fn is_immutable(&self) -> bool {
        matches!(
            self.status(),
            PolicyStatus::Active | PolicyStatus::Cancelled | PolicyStatus::Expired
        )
    }

    /// I-POL-3: sum of verified payments must reach the premium before
    /// activation. The sum itself is a repository-level aggregate; this
    /// takes the already-computed total so the guard stays pure.
    pub fn is_fully_paid(&self, verified_total: Decimal) -> bool {
        verified_total >= self.premium_amount
    }
}

impl ActiveWindow for Policy {
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
        matches!(self.status(), PolicyStatus::Cancelled | PolicyStatus::Expired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn base(status: PolicyStatus) -> Policy {
        Policy {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            policy_number: "POL-1".into(),
            vehicle_id: Uuid::new_v4(),
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
            premium_amount: dec!(1_000_000),
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
    fn draft_and_pending_payment_are_mutable() {
        assert!(!base(PolicyStatus::Draft).is_immutable());
        assert!(!base(PolicyStatus::PendingPayment).is_immutable());
    }

    #[test]
    fn active_cancelled_expired_are_frozen() {
        assert!(base(PolicyStatus::Active).is_immutable());
        assert!(base(PolicyStatus::Cancelled).is_immutable());
        assert!(base(PolicyStatus::Expired).is_immutable());
    }

    #[test]
    fn full_payment_required_to_activate() {
        let p = base(PolicyStatus::PendingPayment);
        assert!(!p.is_fully_paid(dec!(500_000)));
        assert!(p.is_fully_paid(dec!(1_000_000)));
        assert!(p.is_fully_paid(dec!(1_000_001)));
    }
}
