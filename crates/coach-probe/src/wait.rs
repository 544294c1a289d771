//! Polling and timeout helpers.
//!
//! Every operation class (navigation, element wait, whole scenario) runs under
//! its own deadline; exceeding it surfaces as [`ProbeError::Timeout`] for that
//! step instead of a hang.

use std::future::Future;
use std::time::Duration;

use crate::result::{ProbeError, ProbeResult};

/// Default polling interval for element waits (250ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

fn timeout_error(operation: &str, timeout: Duration) -> ProbeError {
    ProbeError::Timeout {
        operation: operation.to_string(),
        ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
    }
}

/// Poll `check` until it yields `true` or `timeout` elapses.
///
/// Returns the time waited. Errors from `check` are returned immediately.
pub async fn wait_until<F, Fut>(
    description: &str,
    timeout: Duration,
    poll_interval: Duration,
    mut check: F,
) -> ProbeResult<Duration>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProbeResult<bool>>,
{
    let start = tokio::time::Instant::now();
    loop {
        if check().await? {
            let waited = start.elapsed();
            tracing::debug!(description, waited_ms = waited.as_millis() as u64, "condition met");
            return Ok(waited);
        }
        let elapsed = start.elapsed();
        if elapsed >= timeout {
            return Err(timeout_error(description, timeout));
        }
        tokio::time::sleep(poll_interval.min(timeout - elapsed)).await;
    }
}

/// Run `fut` under a deadline
pub async fn with_timeout<T, Fut>(operation: &str, timeout: Duration, fut: Fut) -> ProbeResult<T>
where
    Fut: Future<Output = ProbeResult<T>>,
{
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| timeout_error(operation, timeout))?
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_met_after_polls() {
        let mut polls = 0;
        let waited = wait_until(
            "sections rendered",
            Duration::from_secs(5),
            Duration::from_millis(250),
            || {
                polls += 1;
                let done = polls >= 3;
                async move { Ok(done) }
            },
        )
        .await
        .unwrap();
        assert_eq!(polls, 3);
        assert_eq!(waited, Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_times_out() {
        let err = wait_until(
            "never",
            Duration::from_secs(1),
            Duration::from_millis(300),
            || async { Ok(false) },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ProbeError::Timeout { ms: 1000, .. }));
        assert!(err.to_string().contains("never"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_propagates_errors() {
        let err = wait_until("broken", Duration::from_secs(1), Duration::from_millis(10), || async {
            Err(ProbeError::page("target closed"))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, ProbeError::PageError { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_timeout_expires() {
        let err = with_timeout("page load", Duration::from_millis(100), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok(())
        })
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "page load timed out after 100ms");
    }

    #[tokio::test]
    async fn test_with_timeout_passes_value() {
        let value = with_timeout("quick", Duration::from_secs(1), async { Ok(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }
}
