use std::time::Duration;
use tokio::{
    sync::Mutex,
    time::{sleep_until, Instant},
};

/// Minimum-interval limiter shared by every fetch of one fetcher.
///
/// Semantics:
/// - `await_turn` suspends the calling task until `min_interval` has passed
///   since the previous admitted start, then records the new start time.
/// - The lock is held across the wait, so concurrent callers are admitted
///   one at a time and each read-modify-write of the timestamp is atomic.
/// - A disabled limiter admits immediately and never records a timestamp.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    disabled: bool,
    last_start: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration, disabled: bool) -> Self {
        Self {
            min_interval,
            disabled,
            last_start: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Wait for admission. Returns how long the caller was held back.
    pub async fn await_turn(&self) -> Duration {
        if self.disabled {
            return Duration::ZERO;
        }

        let mut last = self.last_start.lock().await;
        let mut waited = Duration::ZERO;
        if let Some(prev) = *last {
            let ready_at = prev + self.min_interval;
            let now = Instant::now();
            if ready_at > now {
                waited = ready_at - now;
                tracing::debug!(
                    wait_ms = waited.as_millis() as u64,
                    min_interval_ms = self.min_interval.as_millis() as u64,
                    "fetch.rate_limit.wait"
                );
                sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
        waited
    }

    /// Start time of the most recently admitted request, if any.
    pub async fn last_request_start(&self) -> Option<Instant> {
        *self.last_start.lock().await
    }
}
