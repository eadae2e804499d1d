//! Failed-login lockout policy.
//!
//! An account is locked for a client address when that address produced
//! `max_failed_attempts` failures inside the trailing window and after the
//! account's last successful login. A success therefore clears the lock.

use chrono::{DateTime, Duration, Utc};

use stowage_core::config::AuthConfig;

/// Lockout thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    /// Failures that trigger the lock.
    pub max_failed_attempts: u32,
    /// Trailing window over which failures count.
    pub window: Duration,
}

impl LockoutPolicy {
    /// Build the policy from auth configuration.
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            max_failed_attempts: config.max_failed_attempts,
            window: Duration::minutes(config.lockout_duration_minutes as i64),
        }
    }

    /// Start of the counting window at `now`.
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.window
    }

    /// Whether `failures` inside the window lock the account.
    ///
    /// A zero threshold disables lockout.
    pub fn is_locked(&self, failures: u64) -> bool {
        self.max_failed_attempts > 0 && failures >= u64::from(self.max_failed_attempts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold() {
        let policy = LockoutPolicy {
            max_failed_attempts: 3,
            window: Duration::minutes(15),
        };
        assert!(!policy.is_locked(2));
        assert!(policy.is_locked(3));
        assert!(policy.is_locked(10));
    }

    #[test]
    fn test_zero_disables() {
        let policy = LockoutPolicy {
            max_failed_attempts: 0,
            window: Duration::minutes(15),
        };
        assert!(!policy.is_locked(100));
    }

    #[test]
    fn test_window_start() {
        let policy = LockoutPolicy::from_config(&AuthConfig::default());
        let now = Utc::now();
        assert_eq!(now - policy.window_start(now), Duration::minutes(15));
    }
}
