//! Global spacing of outbound provider requests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};
use tracing::trace;

/// Serializes provider requests so that consecutive calls start at least
/// `min_interval` apart, whichever provider or view issues them.
#[derive(Debug)]
pub struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval_ms: AtomicU64,
}

impl RateLimiter {
    /// Creates a limiter with the given minimum spacing.
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval_ms: AtomicU64::new(duration_to_ms(min_interval)),
        }
    }

    /// Returns the minimum spacing.
    #[must_use]
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms.load(Ordering::Relaxed))
    }

    /// Changes the minimum spacing for subsequent calls.
    pub fn set_min_interval(&self, min_interval: Duration) {
        self.min_interval_ms
            .store(duration_to_ms(min_interval), Ordering::Relaxed);
    }

    /// Waits until a request may start and records it as started.
    ///
    /// Callers queue on the inner lock, so concurrent callers are released
    /// one interval apart.
    pub async fn throttle(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(previous) = *last {
            let ready_at = previous + self.min_interval();
            if ready_at > Instant::now() {
                trace!(
                    wait_ms = ready_at.saturating_duration_since(Instant::now()).as_millis(),
                    "Throttling provider request"
                );
                sleep_until(ready_at).await;
            }
        }

        *last = Some(Instant::now());
    }
}

fn duration_to_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
