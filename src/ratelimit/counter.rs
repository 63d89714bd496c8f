//! Fixed-window counter and limit policy.

use std::time::{Duration, Instant};

use crate::error::{HirewiseError, Result};

/// How many requests a key may make per window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitPolicy {
    limit: u32,
    window: Duration,
}

impl LimitPolicy {
    /// Create a policy, rejecting a zero limit or an empty window.
    pub fn new(limit: u32, window: Duration) -> Result<Self> {
        if limit == 0 {
            return Err(HirewiseError::InvalidPolicy(
                "limit must be greater than zero".to_string(),
            ));
        }
        if window.is_zero() {
            return Err(HirewiseError::InvalidPolicy(
                "window must be greater than zero".to_string(),
            ));
        }
        Ok(Self { limit, window })
    }

    /// Build a policy from raw caller values, clamping zeros up to 1.
    pub(crate) fn clamped(limit: u32, window_ms: u64) -> Self {
        Self {
            limit: limit.max(1),
            window: Duration::from_millis(window_ms.max(1)),
        }
    }

    /// Maximum requests allowed per window.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Length of the window.
    pub fn window(&self) -> Duration {
        self.window
    }
}

/// Outcome of a single rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Whether the request may proceed
    pub allowed: bool,
    /// The limit that was applied
    pub limit: u32,
    /// Requests left in the current window
    pub remaining: u32,
    /// Time until the current window ends
    pub reset_after: Duration,
}

/// Request count for one key within its current window.
///
/// A burst straddling a window boundary can admit up to twice the limit
/// across the two adjacent windows.
#[derive(Debug, Clone, Copy)]
pub struct WindowCounter {
    count: u64,
    window_start: Instant,
    window: Duration,
}

impl WindowCounter {
    /// Create an empty counter whose window opens at `now`.
    pub fn new(now: Instant, window: Duration) -> Self {
        Self {
            count: 0,
            window_start: now,
            window,
        }
    }

    /// Record one request and decide whether it is within the policy.
    pub fn hit(&mut self, now: Instant, policy: &LimitPolicy) -> RateLimitDecision {
        self.window = policy.window();

        if self.is_expired(now) {
            self.count = 1;
            self.window_start = now;
            return self.decision(now, policy, true);
        }

        self.count += 1;
        let allowed = self.count <= u64::from(policy.limit());
        self.decision(now, policy, allowed)
    }

    /// Whether the window that was last applied has elapsed.
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.window_start) >= self.window
    }

    /// Requests counted in the live window, zero once it has elapsed.
    pub fn count_at(&self, now: Instant) -> u64 {
        if self.is_expired(now) {
            0
        } else {
            self.count
        }
    }

    /// Time until the current window ends.
    pub fn reset_after(&self, now: Instant) -> Duration {
        self.window
            .saturating_sub(now.saturating_duration_since(self.window_start))
    }

    fn decision(&self, now: Instant, policy: &LimitPolicy, allowed: bool) -> RateLimitDecision {
        let remaining = u64::from(policy.limit()).saturating_sub(self.count);
        RateLimitDecision {
            allowed,
            limit: policy.limit(),
            remaining: remaining as u32,
            reset_after: self.reset_after(now),
        }
    }
}
