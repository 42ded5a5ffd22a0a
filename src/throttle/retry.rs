//! Bounded retry with a fixed backoff table.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

use crate::error::{Error, Result};

/// Retries a fallible async operation a bounded number of times.
///
/// Delays come from a lookup table indexed by attempt number; attempts past
/// the end of the table reuse its last entry. The error from the final
/// attempt is always surfaced to the caller, never swallowed.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    delays: Vec<Duration>,
}

impl RetryPolicy {
    /// Create a policy performing at most `max_attempts` total invocations.
    pub fn new(max_attempts: u32, delays: Vec<Duration>) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delays,
        }
    }

    /// Total invocation budget.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        if self.delays.is_empty() {
            return Duration::from_secs(1);
        }
        let idx = (attempt as usize).min(self.delays.len() - 1);
        self.delays[idx]
    }

    /// Invoke `op`, retrying on failure until the budget is exhausted.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    attempt += 1;
                    if attempt >= self.max_attempts {
                        return Err(err);
                    }
                    let delay = self.delay_for(attempt - 1);
                    tracing::warn!(
                        "attempt {}/{} failed: {}, retrying in {:?}",
                        attempt,
                        self.max_attempts,
                        err,
                        delay
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            3,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(5),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn always_failing_op_is_invoked_exactly_max_attempts_times() {
        let policy = RetryPolicy::new(3, vec![Duration::from_millis(10)]);
        let calls = AtomicU32::new(0);

        let result: Result<()> = policy
            .run(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move { Err(Error::Api(format!("boom {}", n))) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // The surfaced error is the one from the last attempt.
        match result {
            Err(Error::Api(msg)) => assert_eq!(msg, "boom 3"),
            other => panic!("unexpected result: {:?}", other.err()),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let policy = RetryPolicy::new(3, vec![Duration::from_millis(10)]);
        let calls = AtomicU32::new(0);

        let result = policy
            .run(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n < 2 {
                        Err(Error::Api("transient".into()))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

        assert_eq!(result.ok(), Some(2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn delay_table_is_clamped_to_last_entry() {
        let policy = RetryPolicy::new(5, vec![Duration::from_millis(1), Duration::from_millis(2)]);
        assert_eq!(policy.delay_for(0), Duration::from_millis(1));
        assert_eq!(policy.delay_for(1), Duration::from_millis(2));
        assert_eq!(policy.delay_for(4), Duration::from_millis(2));
    }

    #[tokio::test(start_paused = true)]
    async fn first_success_short_circuits() {
        let policy = RetryPolicy::default();
        let result = policy.run(|| async { Ok(42u32) }).await;
        assert_eq!(result.ok(), Some(42));
    }
}
