//! Background sweep of expired rate limit windows.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use super::clock::Clock;
use super::limiter::RateLimiter;

/// Handle to a running sweeper. The task stops when the handle is dropped.
#[derive(Debug)]
pub struct SweeperHandle {
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Stop the sweeper.
    pub fn stop(self) {
        drop(self);
    }

    /// Whether the sweeper task has ended.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawn a task that calls [`RateLimiter::sweep_expired`] every `interval`.
///
/// Must be called from within a tokio runtime.
pub fn spawn_sweeper<C>(limiter: Arc<RateLimiter<C>>, interval: Duration) -> SweeperHandle
where
    C: Clock + 'static,
{
    let interval = interval.max(Duration::from_millis(1));
    info!(interval_ms = interval.as_millis() as u64, "Starting rate limit sweeper");

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let removed = limiter.sweep_expired();
            debug!(removed, tracked = limiter.len(), "Sweep complete");
        }
    });

    SweeperHandle { task }
}
