use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Duration, Utc};

use crate::error::{AppError, AppResult};

pub fn hash_password(plain: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("password hash error: {e}")))
}

pub fn verify_password(plain: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default().verify_password(plain.as_bytes(), &parsed).is_ok()
}

/// Failed-login lockout window (spec section 4.2 / 8: repeated failed
/// logins lock the account for a fixed window rather than forever).
pub struct LoginAttempts {
    pub failed_count: i32,
    pub window_started_at: Option<DateTime<Utc>>,
    pub locked_until: Option<DateTime<Utc>>,
}

pub struct LockoutPolicy {
    pub failed_login_limit: i32,
    pub failed_login_window_secs: i64,
    pub lockout_duration_secs: i64,
}

pub enum LoginOutcome {
    Allowed,
    Locked { until: DateTime<Utc> },
}

impl LockoutPolicy {
    /// Decides whether a login attempt may proceed given the account's
    /// current attempt record, evaluated against `now`.
    pub fn check(&self, attempts: &LoginAttempts, now: DateTime<Utc>) -> LoginOutcome {
        if let Some(until) = attempts.locked_until {
            if now < until {
                return LoginOutcome::Locked { until };
            }
        }
        LoginOutcome::Allowed
    }

    /// Computes the next attempt record after a failed login.
    pub fn record_failure(&self, attempts: &LoginAttempts, now: DateTime<Utc>) -> LoginAttempts {
        let window_started_at = match attempts.window_started_at {
            Some(started)
                if now - started < Duration::seconds(self.failed_login_window_secs) =>
            {
                Some(started)
            }
            _ => Some(now),
        };
        let failed_count = if window_started_at == attempts.window_started_at {
            attempts.failed_count + 1
        } else {
            1
        };

        let locked_until = if failed_count >= self.failed_login_limit {
            Some(now + Duration::seconds(self.lockout_duration_secs))
        } else {
            None
        };

        LoginAttempts {
            failed_count,
            window_started_at,
            locked_until,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password("correct horse battery staple", &hash));
        assert!(!verify_password("wrong password", &hash));
    }

    #[test]
    fn lockout_trips_after_limit() {
        let policy = LockoutPolicy {
            failed_login_limit: 3,
            failed_login_window_secs: 900,
            lockout_duration_secs: 900,
        };
        let now = Utc::now();
        let mut attempts = LoginAttempts {
            failed_count: 0,
            window_started_at: None,
            locked_until: None,
        };
        for _ in 0..3 {
            attempts = policy.record_failure(&attempts, now);
        }
        assert!(attempts.locked_until.is_some());
        match policy.check(&attempts, now) {
            LoginOutcome::Locked { .. } => {}
            LoginOutcome::Allowed => panic!("expected lockout"),
        }
    }

    #[test]
    fn lockout_clears_after_window() {
        let policy = LockoutPolicy {
            failed_login_limit: 3,
            failed_login_window_secs: 900,
            lockout_duration_secs: 900,
        };
        let now = Utc::now();
        let attempts = LoginAttempts {
            failed_count: 3,
            window_started_at: Some(now),
            locked_until: Some(now + Duration::seconds(900)),
        };
        let later = now + Duration::seconds(901);
        match policy.check(&attempts, later) {
            LoginOutcome::Allowed => {}
            LoginOutcome::Locked { .. } => panic!("lockout should have expired"),
        }
    }
}
