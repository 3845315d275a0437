//! Exponential-backoff retry combinator for workflow steps.

use rand::Rng;
use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use tracing::warn;

/// Backoff policy: exponential with ±20% jitter.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10_000),
        }
    }
}

impl RetryPolicy {
    /// Delay before the given attempt (1-based): `base × 2^(attempt−1)`,
    /// jittered ±20%, capped at `max_delay`.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        const JITTER: f64 = 0.2;
        let exp = self
            .base_delay
            .as_millis()
            .saturating_mul(1 << attempt.saturating_sub(1).min(10)) as u64;
        let jitter = rand::rng().random_range(-JITTER..=JITTER);
        let jittered = (exp as f64 * (1.0 + jitter)) as u64;
        Duration::from_millis(jittered.min(self.max_delay.as_millis() as u64))
    }
}

/// Run a fallible step with retries and exponential backoff.
pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, label: &str, mut step: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0u32;
    loop {
        match step().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < policy.max_retries => {
                attempt += 1;
                let delay = policy.delay_for_attempt(attempt);
                warn!(
                    "{label} failed (attempt {attempt}/{}), retrying in {delay:?}: {e:#}",
                    policy.max_retries
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
