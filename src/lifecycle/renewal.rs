//! Renewal contract (spec section 4.5): a successor entity's term
//! starts the day after the predecessor's end_date. Term length isn't
//! named by the predecessor's closure fields, so the successor window
//! preserves the predecessor's own term length — documented as an
//! Open Question resolution in DESIGN.md.

use chrono::{Duration, NaiveDate};
use uuid::Uuid;

/// Computes `(start_date, end_date)` for a renewal successor given the
/// predecessor's window. The caller is responsible for creating the
/// new row in `draft` status with this window, a fresh id, and
/// whatever premium/payment terms apply to the renewal.
pub fn successor_window(predecessor_start: NaiveDate, predecessor_end: NaiveDate) -> (NaiveDate, NaiveDate) {
    let term = predecessor_end - predecessor_start;
    let start = predecessor_end + Duration::days(1);
    let end = start + term;
    (start, end)
}

/// Derives the successor's `policy_number` from the predecessor's,
/// appending a fresh unique suffix so the renewal never collides with
/// `policies_tenant_number_key` (tenant_id, policy_number).
pub fn successor_policy_number(predecessor_number: &str) -> String {
    format!("{predecessor_number}-R{}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successor_starts_day_after_predecessor_ends() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        let (s, _) = successor_window(start, end);
        assert_eq!(s, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
    }

    #[test]
    fn successor_preserves_predecessor_term_length() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        let (s, e) = successor_window(start, end);
        assert_eq!(e - s, end - start);
    }

    #[test]
    fn successor_policy_number_differs_from_predecessor() {
        let a = successor_policy_number("POL-0001");
        let b = successor_policy_number("POL-0001");
        assert_ne!(a, b);
        assert!(a.starts_with("POL-0001-R"));
    }
}
