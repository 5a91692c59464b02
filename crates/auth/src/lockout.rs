//! Login failure counting and lockout windows.
//!
//! The guard only mutates the in-memory account; persisting the account and
//! writing the matching audit entry are the caller's job.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::UserAccount;

/// Lockout thresholds.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LockoutPolicy {
    /// Failed attempts after which the account is locked.
    pub max_attempts: u32,
    /// Length of the lockout window.
    pub lock_duration: Duration,
}

impl LockoutPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
    pub const DEFAULT_LOCK_SECONDS: i64 = 300;

    pub fn new(max_attempts: u32, lock_duration: Duration) -> Self {
        Self {
            max_attempts,
            lock_duration,
        }
    }
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_MAX_ATTEMPTS,
            Duration::seconds(Self::DEFAULT_LOCK_SECONDS),
        )
    }
}

/// Whether an account may attempt authentication right now.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LockoutStatus {
    Usable,
    Locked { until: DateTime<Utc> },
}

impl LockoutStatus {
    pub fn is_locked(&self) -> bool {
        matches!(self, LockoutStatus::Locked { .. })
    }
}

/// Result of recording a failed attempt.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FailureOutcome {
    pub attempts: u32,
    pub locked_until: Option<DateTime<Utc>>,
    /// True when this failure started a new lockout window.
    pub newly_locked: bool,
}

/// Tracks failure counters and lockout windows on user accounts.
#[derive(Debug, Copy, Clone, Default)]
pub struct AccountGuard {
    policy: LockoutPolicy,
}

impl AccountGuard {
    pub fn new(policy: LockoutPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &LockoutPolicy {
        &self.policy
    }

    /// Locked iff `locked_until` is set and strictly in the future.
    ///
    /// An expired `locked_until` is left in place; it is cleared by the next
    /// successful authentication.
    pub fn check_lockout(&self, account: &UserAccount, now: DateTime<Utc>) -> LockoutStatus {
        match account.locked_until {
            Some(until) if until > now => LockoutStatus::Locked { until },
            _ => LockoutStatus::Usable,
        }
    }

    pub fn record_failure(&self, account: &mut UserAccount, now: DateTime<Utc>) -> FailureOutcome {
        account.failed_login_attempts = account.failed_login_attempts.saturating_add(1);

        let mut newly_locked = false;
        if account.failed_login_attempts >= self.policy.max_attempts {
            account.locked_until = Some(now + self.policy.lock_duration);
            newly_locked = true;
        }
        account.updated_at = now;

        FailureOutcome {
            attempts: account.failed_login_attempts,
            locked_until: account.locked_until,
            newly_locked,
        }
    }

    /// Clears counters after a successful authentication.
    ///
    /// Returns `true` when the account changed and must be persisted; an
    /// account with no recorded failures is left untouched.
    pub fn record_success(&self, account: &mut UserAccount, now: DateTime<Utc>) -> bool {
        if account.failed_login_attempts == 0 {
            return false;
        }
        account.failed_login_attempts = 0;
        account.locked_until = None;
        account.updated_at = now;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> UserAccount {
        UserAccount::new("bob", "bob@example.com", Utc::now())
    }

    #[test]
    fn fourth_failure_does_not_lock() {
        let guard = AccountGuard::default();
        let mut acct = account();
        let now = Utc::now();

        for _ in 0..4 {
            let outcome = guard.record_failure(&mut acct, now);
            assert!(!outcome.newly_locked);
        }

        assert_eq!(acct.failed_login_attempts, 4);
        assert_eq!(guard.check_lockout(&acct, now), LockoutStatus::Usable);
    }

    #[test]
    fn fifth_failure_locks_for_exactly_the_window() {
        let guard = AccountGuard::default();
        let mut acct = account();
        let t0 = Utc::now();

        for _ in 0..4 {
            guard.record_failure(&mut acct, t0);
        }
        let fifth = t0 + Duration::seconds(10);
        let outcome = guard.record_failure(&mut acct, fifth);

        assert!(outcome.newly_locked);
        assert_eq!(outcome.attempts, 5);
        let until = fifth + Duration::seconds(300);
        assert_eq!(outcome.locked_until, Some(until));

        assert!(guard.check_lockout(&acct, fifth).is_locked());
        assert!(guard.check_lockout(&acct, until - Duration::seconds(1)).is_locked());
        assert_eq!(guard.check_lockout(&acct, until), LockoutStatus::Usable);
    }

    #[test]
    fn expired_lock_is_not_cleared_by_check() {
        let guard = AccountGuard::default();
        let mut acct = account();
        let past = Utc::now() - Duration::hours(1);
        acct.failed_login_attempts = 5;
        acct.locked_until = Some(past);

        assert_eq!(guard.check_lockout(&acct, Utc::now()), LockoutStatus::Usable);
        assert_eq!(acct.locked_until, Some(past));
    }

    #[test]
    fn success_clears_counters() {
        let guard = AccountGuard::default();
        let mut acct = account();
        let now = Utc::now();
        for _ in 0..5 {
            guard.record_failure(&mut acct, now);
        }

        assert!(guard.record_success(&mut acct, now));
        assert_eq!(acct.failed_login_attempts, 0);
        assert_eq!(acct.locked_until, None);
    }

    #[test]
    fn success_without_failures_skips_write() {
        let guard = AccountGuard::default();
        let mut acct = account();
        let before = acct.clone();

        assert!(!guard.record_success(&mut acct, Utc::now()));
        assert_eq!(acct, before);
    }

    #[test]
    fn custom_policy_is_honoured() {
        let guard = AccountGuard::new(LockoutPolicy::new(2, Duration::seconds(60)));
        let mut acct = account();
        let now = Utc::now();

        guard.record_failure(&mut acct, now);
        let outcome = guard.record_failure(&mut acct, now);
        assert_eq!(outcome.locked_until, Some(now + Duration::seconds(60)));
    }
}
