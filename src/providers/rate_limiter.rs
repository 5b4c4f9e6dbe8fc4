//! Per-provider admission gate.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Leaky bucket of capacity one: at most one acquisition in flight, and
/// request starts spaced by at least `interval`.
///
/// Waiters queue FIFO on the slot. Each provider owns its own limiter.
#[derive(Debug)]
pub struct RateLimiter {
    name: String,
    interval: Duration,
    last_start: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(name: impl Into<String>, interval: Duration) -> Self {
        Self {
            name: name.into(),
            interval,
            last_start: Mutex::new(None),
        }
    }

    /// Limiter that never waits.
    pub fn unlimited(name: impl Into<String>) -> Self {
        Self::new(name, Duration::ZERO)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait for the slot and the spacing interval, then record a new start.
    pub async fn acquire(&self) {
        let mut last_start = self.last_start.lock().await;

        if let Some(previous) = *last_start {
            let elapsed = previous.elapsed();
            if elapsed < self.interval {
                let wait = self.interval - elapsed;
                debug!(provider = %self.name, wait_ms = wait.as_millis() as u64, "Rate limited, sleeping");
                sleep(wait).await;
            }
        }

        *last_start = Some(Instant::now());
    }
}
