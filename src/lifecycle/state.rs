use chrono::{DateTime, NaiveDate, Utc};

/// Shared reconstruction of the "when was this record in force" window
/// for Policy and Permit (spec section 4.5):
///
/// - from = activated_at
/// - to   = cancelled_at if cancelled, else end-of-day on end_date if
///          expired, else NULL (still in force)
///
/// `is_active_at` then reduces to `from <= t AND (to IS NULL OR t < to)`.
pub trait ActiveWindow {
    fn activated_at(&self) -> Option<DateTime<Utc>>;
    fn cancelled_at(&self) -> Option<DateTime<Utc>>;
    fn end_date(&self) -> NaiveDate;
    fn is_expired_or_cancelled(&self) -> bool;

    fn active_window(&self) -> Option<(DateTime<Utc>, Option<DateTime<Utc>>)> {
        let from = self.activated_at()?;
        let to = if let Some(cancelled_at) = self.cancelled_at() {
            Some(cancelled_at)
        } else if self.is_expired_or_cancelled() {
            Some(end_of_day(self.end_date()))
        } else {
            None
        };
        Some((from, to))
    }

    fn is_active_at(&self, t: DateTime<Utc>) -> bool {
        match self.active_window() {
            Some((from, Some(to))) => from <= t && t < to,
            Some((from, None)) => from <= t,
            None => false,
        }
    }
}

fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.succ_opt()
        .unwrap_or(date)
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        activated_at: Option<DateTime<Utc>>,
        cancelled_at: Option<DateTime<Utc>>,
        end_date: NaiveDate,
        closed: bool,
    }

    impl ActiveWindow for Fixture {
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
            self.closed
        }
    }

    #[test]
    fn never_activated_is_never_active() {
        let f = Fixture {
            activated_at: None,
            cancelled_at: None,
            end_date: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
            closed: false,
        };
        assert!(!f.is_active_at(Utc::now()));
    }

    #[test]
    fn still_active_has_no_upper_bound() {
        let from = DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let f = Fixture {
            activated_at: Some(from),
            cancelled_at: None,
            end_date: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
            closed: false,
        };
        assert!(f.is_active_at(from));
        assert!(f.is_active_at(from + chrono::Duration::days(3650)));
    }

    #[test]
    fn cancelled_closes_window_at_cancellation_instant() {
        let from = DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let cancelled = from + chrono::Duration::days(10);
        let f = Fixture {
            activated_at: Some(from),
            cancelled_at: Some(cancelled),
            end_date: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
            closed: true,
        };
        assert!(f.is_active_at(cancelled - chrono::Duration::seconds(1)));
        assert!(!f.is_active_at(cancelled));
    }

    #[test]
    fn expired_closes_window_the_day_after_end_date() {
        let from = DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let end_date = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        let f = Fixture {
            activated_at: Some(from),
            cancelled_at: None,
            end_date,
            closed: true,
        };
        let last_in_force_instant = end_date.and_hms_opt(23, 59, 59).unwrap().and_utc();
        assert!(f.is_active_at(last_in_force_instant));
        let next_day = end_date.succ_opt().unwrap().and_hms_opt(0, 0, 0).unwrap().and_utc();
        assert!(!f.is_active_at(next_day));
    }
}
