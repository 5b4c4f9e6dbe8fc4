use std::time::Duration;
use tokio::time::sleep;
use tracing::info;

/// Fixed pause between (size, token) groups, on top of per-provider limits.
#[derive(Debug, Clone, Copy)]
pub struct GroupPacer {
    pause: Duration,
}

impl GroupPacer {
    pub fn new(pause: Duration) -> Self {
        Self { pause }
    }

    /// Pacer that never waits, for tests.
    pub fn none() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn pause_duration(&self) -> Duration {
        self.pause
    }

    pub async fn pause(&self) {
        if self.pause.is_zero() {
            return;
        }
        info!(pause_ms = self.pause.as_millis() as u64, "Pausing before next group");
        sleep(self.pause).await;
    }
}

impl Default for GroupPacer {
    fn default() -> Self {
        Self::new(Duration::from_secs(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_pause_waits_configured_duration() {
        let pacer = GroupPacer::new(Duration::from_millis(2_000));
        let start = Instant::now();
        pacer.pause().await;
        assert!(start.elapsed() >= Duration::from_millis(2_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_none_does_not_wait() {
        let start = Instant::now();
        GroupPacer::none().pause().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
