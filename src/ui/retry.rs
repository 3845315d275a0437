//! Retry wrapper for flaky UI actions.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use tracing::debug;

/// Policy for [`with_ui_retry`].
#[derive(Debug, Clone, Copy)]
pub struct UiRetryPolicy {
    pub max_retries: usize,
    pub delay: Duration,
}

impl Default for UiRetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            delay: Duration::from_millis(400),
        }
    }
}

/// Run a UI action, retrying on error with a fixed delay.
///
/// UI actions are cheap and idempotent (clicks on already-open dropdowns are
/// no-ops), so this stays simpler than the exponential site-level backoff.
pub async fn with_ui_retry<T, F, Fut>(policy: UiRetryPolicy, mut action: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_err = None;
    for attempt in 0..=policy.max_retries {
        match action().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                debug!("ui action failed (attempt {attempt}): {e:#}");
                last_err = Some(e);
                if attempt < policy.max_retries {
                    tokio::time::sleep(policy.delay).await;
                }
            }
        }
    }
    Err(last_err.unwrap_or_else(|| anyhow::anyhow!("ui action failed with no error recorded")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn retries_until_success() {
        let calls = AtomicUsize::new(0);
        let result = with_ui_retry(
            UiRetryPolicy {
                max_retries: 3,
                delay: Duration::from_millis(1),
            },
            || async {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(anyhow::anyhow!("not yet"))
                } else {
                    Ok(n)
                }
            },
        )
        .await;
        assert_eq!(result.expect("third attempt succeeds"), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausts_and_returns_last_error() {
        let result: Result<()> = with_ui_retry(
            UiRetryPolicy {
                max_retries: 1,
                delay: Duration::from_millis(1),
            },
            || async { Err(anyhow::anyhow!("always fails")) },
        )
        .await;
        assert!(result.is_err());
    }
}
