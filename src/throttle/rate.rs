//! Global rate limiting for metadata requests.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

/// Throttles callers to a fixed maximum rate.
///
/// One shared instance guards the metadata-fetch path; byte downloads are
/// bounded by the worker pool instead. `acquire` completions by any set of
/// callers are spaced at least `1 / max_per_second` apart.
pub struct RateLimiter {
    min_interval: Duration,
    last_acquire: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a limiter allowing at most `max_per_second` acquisitions per second.
    pub fn new(max_per_second: f64) -> Self {
        let max = if max_per_second > 0.0 {
            max_per_second
        } else {
            1.0
        };
        Self {
            min_interval: Duration::from_secs_f64(1.0 / max),
            last_acquire: Mutex::new(None),
        }
    }

    /// Wait until the minimum interval since the previous acquire has elapsed.
    ///
    /// The lock is held across the sleep so concurrent callers serialize and
    /// each completion restarts the interval.
    pub async fn acquire(&self) {
        let mut last = self.last_acquire.lock().await;
        let now = Instant::now();
        let ready_at = match *last {
            Some(prev) => prev + self.min_interval,
            None => now,
        };
        if ready_at > now {
            sleep_until(ready_at).await;
        }
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn ten_acquires_at_two_per_second_take_at_least_4_5s() {
        let limiter = RateLimiter::new(2.0);
        let start = Instant::now();
        for _ in 0..10 {
            limiter.acquire().await;
        }
        // First acquire is free, the remaining nine wait 500ms each.
        assert!(start.elapsed() >= Duration::from_millis(4500));
    }

    #[tokio::test(start_paused = true)]
    async fn consecutive_completions_are_spaced_by_min_interval() {
        let limiter = RateLimiter::new(2.0);
        limiter.acquire().await;
        let mut prev = Instant::now();
        for _ in 0..5 {
            limiter.acquire().await;
            let now = Instant::now();
            assert!(now.duration_since(prev) >= Duration::from_millis(499));
            prev = now;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn first_acquire_does_not_wait() {
        let limiter = RateLimiter::new(0.5);
        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(1));
    }
}
