//! Request pacing for the keyword idea service.

use tokio::time::{sleep, Duration, Instant};

/// Minimum spacing between keyword idea requests.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(1500);

/// Extra pause after the API reports quota exhaustion.
pub const DEFAULT_RATE_LIMIT_COOLDOWN: Duration = Duration::from_secs(5);

/// Fixed minimum-interval throttle.
///
/// Each call to [`Throttle::wait_if_needed`] returns no sooner than
/// `min_interval` after the previous call returned. The first call returns
/// immediately. The timestamp is taken after any sleep, so the spacing holds
/// return-to-return regardless of how long the request in between takes.
#[derive(Debug, Clone)]
pub struct Throttle {
    min_interval: Duration,
    last_request_at: Option<Instant>,
}

impl Throttle {
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request_at: None,
        }
    }

    #[must_use]
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Sleeps until `min_interval` has passed since the last call, then
    /// records now as the last request time.
    pub async fn wait_if_needed(&mut self) {
        if let Some(last) = self.last_request_at {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                let remaining = self.min_interval - elapsed;
                log::debug!("Throttling for {}ms", remaining.as_millis());
                sleep(remaining).await;
            }
        }
        self.last_request_at = Some(Instant::now());
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }
}
