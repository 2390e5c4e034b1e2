//! Sign-in brute force protection

use crate::config::SignInLimits;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Per-client failure tracking with exponential lockout
#[derive(Debug)]
pub struct AuthRateLimiter {
    /// Map of client identifier -> tracker
    attempts: DashMap<String, AuthAttemptTracker>,
    max_attempts: u32,
    /// Time window for counting failures (seconds)
    window_secs: u64,
    /// First lockout length; doubles with every further lockout
    base_lockout_secs: u64,
    blocked_count: AtomicU64,
}

#[derive(Debug)]
struct AuthAttemptTracker {
    failure_count: u32,
    window_start: Instant,
    lockout_until: Option<Instant>,
    lockout_count: u32,
}

impl AuthAttemptTracker {
    fn new(now: Instant) -> Self {
        Self {
            failure_count: 0,
            window_start: now,
            lockout_until: None,
            lockout_count: 0,
        }
    }
}

impl Default for AuthRateLimiter {
    fn default() -> Self {
        Self::from_limits(&SignInLimits::default())
    }
}

impl AuthRateLimiter {
    pub fn new(max_attempts: u32, window_secs: u64, base_lockout_secs: u64) -> Self {
        Self {
            attempts: DashMap::new(),
            max_attempts: max_attempts.max(1),
            window_secs,
            base_lockout_secs,
            blocked_count: AtomicU64::new(0),
        }
    }

    pub fn from_limits(limits: &SignInLimits) -> Self {
        Self::new(limits.max_attempts, limits.window_secs, limits.lockout_secs)
    }

    /// `Err(seconds)` while the client is locked out
    pub fn check_allowed(&self, client_id: &str) -> Result<(), u64> {
        let now = Instant::now();

        let mut entry = self
            .attempts
            .entry(client_id.to_string())
            .or_insert_with(|| AuthAttemptTracker::new(now));
        let tracker = entry.value_mut();

        if let Some(lockout_until) = tracker.lockout_until {
            if now < lockout_until {
                let remaining = lockout_until.duration_since(now).as_secs().max(1);
                self.blocked_count.fetch_add(1, Ordering::Relaxed);
                return Err(remaining);
            }
            tracker.lockout_until = None;
        }

        if now.duration_since(tracker.window_start) > Duration::from_secs(self.window_secs) {
            tracker.failure_count = 0;
            tracker.window_start = now;
        }

        Ok(())
    }

    /// Count a failure; returns the lockout length when this failure triggered one
    pub fn record_failure(&self, client_id: &str) -> Option<u64> {
        let now = Instant::now();

        let mut entry = self
            .attempts
            .entry(client_id.to_string())
            .or_insert_with(|| AuthAttemptTracker::new(now));
        let tracker = entry.value_mut();
        tracker.failure_count += 1;

        if tracker.failure_count >= self.max_attempts {
            let multiplier = 2u64.saturating_pow(tracker.lockout_count);
            let lockout_secs = self.base_lockout_secs.saturating_mul(multiplier);

            tracker.lockout_until = Some(now + Duration::from_secs(lockout_secs));
            tracker.lockout_count += 1;
            tracker.failure_count = 0;

            tracing::warn!(
                "Sign-in client {} locked out for {} seconds (lockout #{})",
                client_id,
                lockout_secs,
                tracker.lockout_count
            );

            return Some(lockout_secs);
        }

        None
    }

    pub fn record_success(&self, client_id: &str) {
        if let Some(mut entry) = self.attempts.get_mut(client_id) {
            entry.failure_count = 0;
        }
    }

    pub fn blocked_attempts(&self) -> u64 {
        self.blocked_count.load(Ordering::Relaxed)
    }

    /// Drop trackers that are neither recent nor locked out
    pub fn cleanup_old_entries(&self) {
        let now = Instant::now();
        let max_age = Duration::from_secs(self.window_secs * 2);

        self.attempts.retain(|_, tracker| {
            now.duration_since(tracker.window_start) < max_age
                || tracker.lockout_until.is_some_and(|until| until > now)
        });
    }

    pub fn tracked_clients(&self) -> usize {
        self.attempts.len()
    }
}
