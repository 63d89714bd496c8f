//! Fixed-window rate limiting keyed by arbitrary strings.

mod clock;
mod counter;
mod key;
mod limiter;
mod rules;
mod sweeper;

pub use clock::{Clock, ManualClock, SystemClock};
pub use counter::{LimitPolicy, RateLimitDecision, WindowCounter};
pub use key::RateLimitKey;
pub use limiter::RateLimiter;
pub use rules::{RateLimitRule, RateLimitRules, ScopeRule, TimeUnit};
pub use sweeper::{spawn_sweeper, SweeperHandle};
