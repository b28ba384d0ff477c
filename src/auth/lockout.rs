//! Failed-Login Tracking
//!
//! In-memory tracking of failed login attempts per username, with a lockout
//! once the threshold is crossed. The tracker is keyed by the *submitted*
//! username whether or not an account with that name exists, so probing a
//! name for existence costs the same as guessing a password.
//!
//! Suitable for single-instance deployments; a distributed deployment would
//! put the records behind shared storage instead.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::observability::SecurityEvent;
use crate::security_event;

/// Lockout policy configuration
#[derive(Debug, Clone)]
pub struct LockoutPolicy {
    /// Failed attempts before lockout
    pub max_attempts: u32,
    /// Window within which attempts are counted
    pub attempt_window: Duration,
    /// How long a locked name stays locked
    pub lockout_duration: Duration,
}

impl Default for LockoutPolicy {
    /// 5 failures within 30 minutes lock the name for 15 minutes.
    fn default() -> Self {
        Self {
            max_attempts: 5,
            attempt_window: Duration::from_secs(30 * 60),
            lockout_duration: Duration::from_secs(15 * 60),
        }
    }
}

/// Attempt history for one username
#[derive(Debug, Default)]
struct AttemptRecord {
    failed_attempts: Vec<Instant>,
    locked_until: Option<Instant>,
}

impl AttemptRecord {
    fn recent_failures(&self, window: Duration, now: Instant) -> u32 {
        self.failed_attempts
            .iter()
            .filter(|&&t| now.duration_since(t) < window)
            .count() as u32
    }

    fn remaining_lockout(&self, now: Instant) -> Option<Duration> {
        let until = self.locked_until?;
        if until > now {
            Some(until - now)
        } else {
            None
        }
    }

    fn cleanup(&mut self, window: Duration, now: Instant) {
        self.failed_attempts
            .retain(|&t| now.duration_since(t) < window);
    }
}

/// Result of recording a failed attempt
#[derive(Debug, Clone, Copy)]
pub struct AttemptOutcome {
    /// Failures counted inside the window, including this one
    pub failed_count: u32,
    /// Whether this attempt triggered a lockout
    pub locked_out: bool,
}

/// In-memory failed-login tracker
#[derive(Debug)]
pub struct LoginTracker {
    policy: LockoutPolicy,
    records: RwLock<HashMap<String, AttemptRecord>>,
}

impl LoginTracker {
    /// Create a tracker with the given policy
    pub fn new(policy: LockoutPolicy) -> Self {
        Self {
            policy,
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Create a tracker with the default policy
    pub fn with_default_policy() -> Self {
        Self::new(LockoutPolicy::default())
    }

    /// Remaining lockout for a username, if it is currently locked
    pub fn check_lockout(&self, username: &str) -> Option<Duration> {
        let records = self.records.read().unwrap();
        records.get(username)?.remaining_lockout(Instant::now())
    }

    /// Record a failed attempt, locking the name when the threshold is hit
    pub fn record_failure(&self, username: &str) -> AttemptOutcome {
        let now = Instant::now();
        let mut records = self.records.write().unwrap();
        let record = records.entry(username.to_string()).or_default();

        record.cleanup(self.policy.attempt_window, now);
        record.failed_attempts.push(now);

        let failed_count = record.recent_failures(self.policy.attempt_window, now);
        let locked_out =
            failed_count >= self.policy.max_attempts && record.remaining_lockout(now).is_none();

        if locked_out {
            record.locked_until = Some(now + self.policy.lockout_duration);
            security_event!(
                SecurityEvent::AccountLocked,
                username = %username,
                failed_count = failed_count,
                lockout_secs = self.policy.lockout_duration.as_secs(),
                "Username locked after repeated failed logins"
            );
        }

        AttemptOutcome {
            failed_count,
            locked_out,
        }
    }

    /// Record a successful login, clearing the failure history
    pub fn record_success(&self, username: &str) {
        let mut records = self.records.write().unwrap();
        if let Some(record) = records.get_mut(username) {
            record.failed_attempts.clear();
            record.locked_until = None;
        }
    }

    /// Drop stale records (call periodically on long-lived processes)
    pub fn cleanup(&self) {
        let now = Instant::now();
        let window = self.policy.attempt_window;
        let mut records = self.records.write().unwrap();
        records.retain(|_, record| {
            record.cleanup(window, now);
            !record.failed_attempts.is_empty() || record.remaining_lockout(now).is_some()
        });
    }
}
