//! Retry with exponential backoff for operations against an
//! asynchronously-rendering page.
//!
//! Only the final attempt's failure reaches the caller. The capturing variant
//! stores a screenshot after every failed attempt so flaky steps leave a trail.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::time::Duration;

use crate::artifacts::ArtifactStore;
use crate::config::millis;
use crate::page::PageHandle;
use crate::result::{ProbeError, ProbeResult};

/// Configuration for retry behavior
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryOptions {
    /// Total attempts including the first (at least 1)
    pub max_attempts: u32,
    /// Delay after the first failed attempt
    #[serde(with = "millis")]
    pub base_delay: Duration,
    /// Upper bound for any single delay
    #[serde(with = "millis")]
    pub max_delay: Duration,
    /// Growth factor applied per attempt (greater than 1)
    pub backoff_multiplier: f64,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryOptions {
    /// Validated options
    pub fn new(
        max_attempts: u32,
        base_delay: Duration,
        max_delay: Duration,
        backoff_multiplier: f64,
    ) -> ProbeResult<Self> {
        let options = Self {
            max_attempts,
            base_delay,
            max_delay,
            backoff_multiplier,
        };
        options.validate()?;
        Ok(options)
    }

    /// A single attempt, no retry
    #[must_use]
    pub fn once() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Set maximum attempts
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the base delay
    #[must_use]
    pub const fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Set the delay cap
    #[must_use]
    pub const fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the backoff multiplier
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Reject zero attempts and non-growing multipliers
    pub fn validate(&self) -> ProbeResult<()> {
        if self.max_attempts == 0 {
            return Err(ProbeError::invalid_config("max_attempts must be at least 1"));
        }
        if self.backoff_multiplier.is_nan()
            || self.backoff_multiplier <= 1.0
            || self.backoff_multiplier.is_infinite()
        {
            return Err(ProbeError::invalid_config(format!(
                "backoff_multiplier must be a finite number greater than 1, got {}",
                self.backoff_multiplier
            )));
        }
        if self.max_delay < self.base_delay {
            return Err(ProbeError::invalid_config(
                "max_delay must not be smaller than base_delay",
            ));
        }
        Ok(())
    }

    /// Delay after failed attempt `attempt` (1-based):
    /// `min(base_delay * multiplier^(attempt - 1), max_delay)`
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let nanos = self.base_delay.as_nanos() as f64 * self.backoff_multiplier.powi(exponent);
        if !nanos.is_finite() || nanos >= self.max_delay.as_nanos() as f64 {
            self.max_delay
        } else {
            Duration::from_nanos(nanos.round() as u64).min(self.max_delay)
        }
    }
}

/// The operation failed on every attempt
#[derive(Debug, Clone)]
pub struct RetryError<E> {
    /// Operation name
    pub operation: String,
    /// Number of attempts made
    pub attempts: u32,
    /// Error from the final attempt
    pub last_error: E,
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} failed after {} attempt(s): {}",
            self.operation, self.attempts, self.last_error
        )
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for RetryError<E> {}

impl<E: fmt::Display> From<RetryError<E>> for ProbeError {
    fn from(err: RetryError<E>) -> Self {
        Self::RetryExhausted {
            operation: err.operation,
            attempts: err.attempts,
            message: err.last_error.to_string(),
        }
    }
}

/// Run `op` until it succeeds or `options.max_attempts` is reached.
///
/// `op` receives the 1-based attempt number.
pub async fn with_retry<T, E, F, Fut>(
    operation: &str,
    options: &RetryOptions,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    let max_attempts = options.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => {
                tracing::debug!(operation, attempt, max_attempts, outcome = "success");
                return Ok(value);
            }
            Err(error) if attempt >= max_attempts => {
                tracing::warn!(operation, attempt, max_attempts, outcome = "exhausted", %error);
                return Err(RetryError {
                    operation: operation.to_string(),
                    attempts: attempt,
                    last_error: error,
                });
            }
            Err(error) => {
                let delay = options.delay_for_attempt(attempt);
                tracing::info!(
                    operation,
                    attempt,
                    max_attempts,
                    outcome = "retrying",
                    delay_ms = delay.as_millis() as u64,
                    %error
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// [`with_retry`] that also saves a screenshot of `page` after each failed attempt.
///
/// Screenshot problems are logged and never replace the operation's error.
pub async fn with_retry_capturing<P, T, E, F, Fut>(
    page: &P,
    artifacts: &ArtifactStore,
    operation: &str,
    options: &RetryOptions,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    P: PageHandle + ?Sized,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    with_retry(operation, options, |attempt| {
        let fut = op(attempt);
        async move {
            match fut.await {
                Ok(value) => Ok(value),
                Err(error) => {
                    let suffix = format!("attempt-{attempt}");
                    let _ = artifacts.capture_screenshot(page, operation, &suffix).await;
                    Err(error)
                }
            }
        }
    })
    .await
}
