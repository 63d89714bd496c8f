//! Core rate limiter implementation.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::time::Instant;
use tracing::{debug, trace};

use super::clock::{Clock, SystemClock};
use super::counter::{LimitPolicy, RateLimitDecision, WindowCounter};
use super::key::RateLimitKey;
use super::rules::RateLimitRules;

/// The in-memory fixed-window rate limiter.
///
/// Owns one counter per key. Checking a key locks only the map shard that
/// holds it, so the read-check-increment is atomic per key while other keys
/// proceed in parallel. Share it behind an `Arc`.
///
/// Entries are only removed by [`RateLimiter::sweep_expired`]; long-running
/// hosts should call it periodically (see [`super::spawn_sweeper`]).
pub struct RateLimiter<C: Clock = SystemClock> {
    /// Live windows indexed by key
    windows: DashMap<String, WindowCounter>,
    clock: C,
}

impl RateLimiter {
    /// Create a new rate limiter on the system clock.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> RateLimiter<C> {
    /// Create a rate limiter reading time from `clock`.
    pub fn with_clock(clock: C) -> Self {
        Self {
            windows: DashMap::new(),
            clock,
        }
    }

    /// Count one request for `key` against `limit` requests per `window_ms`.
    ///
    /// Never fails. A zero `limit` or `window_ms` is treated as 1.
    pub fn check_rate_limit(&self, key: &str, limit: u32, window_ms: u64) -> RateLimitDecision {
        self.check(key, &LimitPolicy::clamped(limit, window_ms))
    }

    /// Count one request for `key` against a policy.
    pub fn check(&self, key: &str, policy: &LimitPolicy) -> RateLimitDecision {
        let now = self.clock.now();

        trace!(
            key = %key,
            limit = policy.limit(),
            window_ms = policy.window().as_millis() as u64,
            "Checking rate limit"
        );

        let decision = match self.windows.get_mut(key) {
            Some(mut counter) => counter.hit(now, policy),
            None => self.insert_and_hit(key, now, policy),
        };

        if !decision.allowed {
            debug!(
                key = %key,
                limit = decision.limit,
                reset_after_ms = decision.reset_after.as_millis() as u64,
                "Rate limit exceeded"
            );
        }

        decision
    }

    /// Count one request for a `scope:subject` key under the scope's rule.
    ///
    /// Returns `None` when the key has no scope or no rule applies to it;
    /// nothing is counted in that case.
    pub fn check_with_rules(&self, key: &str, rules: &RateLimitRules) -> Option<RateLimitDecision> {
        let parsed = RateLimitKey::parse(key)?;
        let policy = rules.policy_for(&parsed.scope)?;
        Some(self.check(key, &policy))
    }

    fn insert_and_hit(&self, key: &str, now: Instant, policy: &LimitPolicy) -> RateLimitDecision {
        // Another caller may have created the window since the lookup.
        match self.windows.entry(key.to_owned()) {
            Entry::Occupied(mut occupied) => occupied.get_mut().hit(now, policy),
            Entry::Vacant(vacant) => {
                debug!(
                    key = %key,
                    limit = policy.limit(),
                    window_ms = policy.window().as_millis() as u64,
                    "Creating new rate limit window"
                );
                let mut counter = vacant.insert(WindowCounter::new(now, policy.window()));
                counter.hit(now, policy)
            }
        }
    }

    /// Remove every entry whose window has elapsed.
    ///
    /// Unobservable to callers: the next check for a removed key would have
    /// reset it anyway. Returns the number of entries removed.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let mut removed = 0;
        self.windows.retain(|_, counter| {
            let expired = counter.is_expired(now);
            if expired {
                removed += 1;
            }
            !expired
        });

        if removed > 0 {
            debug!(removed, remaining = self.windows.len(), "Swept expired rate limit windows");
        }
        removed
    }

    /// Requests counted for `key` in its live window.
    ///
    /// Returns `None` if no entry exists for the key.
    pub fn current_count(&self, key: &str) -> Option<u64> {
        let now = self.clock.now();
        self.windows.get(key).map(|counter| counter.count_at(now))
    }

    /// Clear all entries.
    pub fn clear(&self) {
        self.windows.clear();
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    /// Whether no keys are tracked.
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratelimit::clock::ManualClock;
    use crate::ratelimit::RateLimitKey;
    use std::sync::Arc;
    use std::time::Duration;

    fn manual_limiter() -> (Arc<ManualClock>, RateLimiter<Arc<ManualClock>>) {
        let clock = Arc::new(ManualClock::new());
        let limiter = RateLimiter::with_clock(Arc::clone(&clock));
        (clock, limiter)
    }

    #[test]
    fn test_rate_limiter_creation() {
        let limiter = RateLimiter::new();
        assert!(limiter.is_empty());
        assert_eq!(limiter.len(), 0);
    }

    #[test]
    fn test_first_call_creates_entry() {
        let limiter = RateLimiter::new();

        let decision = limiter.check_rate_limit("job-search:1", 3, 60_000);
        assert!(decision.allowed);
        assert_eq!(decision.limit, 3);
        assert_eq!(decision.remaining, 2);
        assert_eq!(limiter.len(), 1);
        assert_eq!(limiter.current_count("job-search:1"), Some(1));
    }

    #[test]
    fn test_limit_then_deny_within_window() {
        let (clock, limiter) = manual_limiter();

        for _ in 0..5 {
            assert!(limiter.check_rate_limit("job-search:1", 5, 1_000).allowed);
            clock.advance(Duration::from_millis(10));
        }

        assert!(!limiter.check_rate_limit("job-search:1", 5, 1_000).allowed);
        assert!(!limiter.check_rate_limit("job-search:1", 5, 1_000).allowed);
    }

    #[test]
    fn test_window_elapsed_resets_count() {
        let (clock, limiter) = manual_limiter();

        for _ in 0..3 {
            limiter.check_rate_limit("job-search:1", 2, 1_000);
        }
        assert_eq!(limiter.current_count("job-search:1"), Some(3));

        clock.advance(Duration::from_millis(1_000));
        let decision = limiter.check_rate_limit("job-search:1", 2, 1_000);
        assert!(decision.allowed);
        assert_eq!(limiter.current_count("job-search:1"), Some(1));
    }

    #[test]
    fn test_window_not_yet_elapsed() {
        let (clock, limiter) = manual_limiter();

        limiter.check_rate_limit("job-search:1", 1, 1_000);
        clock.advance(Duration::from_millis(999));
        assert!(!limiter.check_rate_limit("job-search:1", 1, 1_000).allowed);
    }

    #[test]
    fn test_boundary_burst_admits_twice_the_limit() {
        let (clock, limiter) = manual_limiter();

        clock.advance(Duration::from_millis(900));
        let first = limiter.check_rate_limit("k", 3, 1_000);
        assert!(first.allowed);
        assert!(limiter.check_rate_limit("k", 3, 1_000).allowed);
        assert!(limiter.check_rate_limit("k", 3, 1_000).allowed);

        clock.advance(Duration::from_millis(1_000));
        let admitted = (0..4)
            .filter(|_| limiter.check_rate_limit("k", 3, 1_000).allowed)
            .count();
        assert_eq!(admitted, 3);
    }

    #[test]
    fn test_different_keys_are_independent() {
        let limiter = RateLimiter::new();
        let a = RateLimitKey::new("job-search", "a").to_string_key();
        let b = RateLimitKey::new("job-search", "b").to_string_key();

        limiter.check_rate_limit(&a, 1, 60_000);
        assert!(!limiter.check_rate_limit(&a, 1, 60_000).allowed);

        assert!(limiter.check_rate_limit(&b, 1, 60_000).allowed);
        assert_eq!(limiter.current_count(&a), Some(2));
        assert_eq!(limiter.current_count(&b), Some(1));
    }

    #[test]
    fn test_zero_arguments_are_clamped() {
        let limiter = RateLimiter::new();

        let decision = limiter.check_rate_limit("k", 0, 60_000);
        assert!(decision.allowed);
        assert_eq!(decision.limit, 1);
        assert!(!limiter.check_rate_limit("k", 0, 60_000).allowed);
    }

    #[test]
    fn test_check_with_policy() {
        let limiter = RateLimiter::new();
        let policy = LimitPolicy::new(2, Duration::from_secs(60)).unwrap();

        assert!(limiter.check("k", &policy).allowed);
        assert!(limiter.check("k", &policy).allowed);
        let denied = limiter.check("k", &policy);
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, 0);
        assert!(denied.reset_after <= Duration::from_secs(60));
    }

    #[test]
    fn test_check_with_rules_uses_key_scope() {
        let rules = RateLimitRules::from_yaml(
            r#"
scopes:
  - scope: job-search
    rate_limit:
      requests_per_unit: 1
      unit: minute
"#,
        )
        .unwrap();
        let limiter = RateLimiter::new();

        assert!(limiter.check_with_rules("job-search:7", &rules).unwrap().allowed);
        assert!(!limiter.check_with_rules("job-search:7", &rules).unwrap().allowed);
        assert!(limiter.check_with_rules("interview:7", &rules).is_none());
        assert!(limiter.check_with_rules("unscoped", &rules).is_none());
        assert_eq!(limiter.len(), 1);
    }

    #[test]
    fn test_sweep_counts_each_removal() {
        let (clock, limiter) = manual_limiter();

        for i in 0..5 {
            limiter.check_rate_limit(&format!("expired:{}", i), 5, 100);
        }
        limiter.check_rate_limit("live", 5, 10_000);

        clock.advance(Duration::from_millis(200));
        assert_eq!(limiter.sweep_expired(), 5);
        assert_eq!(limiter.sweep_expired(), 0);
        assert_eq!(limiter.len(), 1);
    }

    #[test]
    fn test_sweep_removes_only_expired() {
        let (clock, limiter) = manual_limiter();

        limiter.check_rate_limit("short", 5, 100);
        limiter.check_rate_limit("long", 5, 10_000);

        clock.advance(Duration::from_millis(500));
        assert_eq!(limiter.sweep_expired(), 1);
        assert_eq!(limiter.current_count("short"), None);
        assert_eq!(limiter.current_count("long"), Some(1));
    }

    #[test]
    fn test_current_count_after_expiry_is_zero() {
        let (clock, limiter) = manual_limiter();

        limiter.check_rate_limit("k", 5, 100);
        clock.advance(Duration::from_millis(100));
        assert_eq!(limiter.current_count("k"), Some(0));
        assert_eq!(limiter.current_count("missing"), None);
    }

    #[test]
    fn test_clear() {
        let limiter = RateLimiter::new();
        limiter.check_rate_limit("k", 5, 1_000);
        assert_eq!(limiter.len(), 1);

        limiter.clear();
        assert!(limiter.is_empty());
    }

    #[test]
    fn test_concurrent_checks_never_over_admit() {
        let limiter = Arc::new(RateLimiter::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || {
                    (0..50)
                        .filter(|_| limiter.check_rate_limit("shared", 100, 60_000).allowed)
                        .count()
                })
            })
            .collect();

        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 100);
        assert_eq!(limiter.current_count("shared"), Some(400));
    }
}
