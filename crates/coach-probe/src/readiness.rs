//! Readiness checks: is the frontend answering, and does it expose the query controls?

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::millis;
use crate::locator::{Selector, SelectorChain};
use crate::page::PageHandle;
use crate::result::{ProbeError, ProbeResult};

/// HTTP polling settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessOptions {
    /// Requests per `check_readiness` call
    pub attempts: u32,
    /// Pause between failed requests
    #[serde(with = "millis")]
    pub retry_delay: Duration,
    /// Pause between `check_readiness` calls in `wait_for_ready`
    #[serde(with = "millis")]
    pub poll_interval: Duration,
    /// Per-request timeout
    #[serde(with = "millis")]
    pub request_timeout: Duration,
}

impl Default for ReadinessOptions {
    fn default() -> Self {
        Self {
            attempts: 3,
            retry_delay: Duration::from_secs(2),
            poll_interval: Duration::from_secs(1),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Outcome of a readiness probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessResult {
    /// A 2xx response was received
    pub ready: bool,
    /// Last failure, when not ready
    pub error: Option<String>,
    /// Latency of the successful request
    pub response_time: Option<Duration>,
    /// Requests made
    pub attempts: u32,
}

/// Selector chain for the query text input
#[must_use]
pub fn query_input_chain() -> SelectorChain {
    SelectorChain::new(
        "query input",
        vec![
            Selector::test_id("query-input"),
            Selector::css("textarea"),
            Selector::css("input[name=\"query\"]"),
            Selector::css("input[type=\"text\"]"),
        ],
    )
}

/// Selector chain for the submit control
#[must_use]
pub fn submit_button_chain() -> SelectorChain {
    SelectorChain::new(
        "submit button",
        vec![
            Selector::test_id("submit-button"),
            Selector::css("button[type=\"submit\"]"),
            Selector::css_with_text("button", "Get Advice"),
            Selector::css_with_text("button", "Submit"),
        ],
    )
}

/// Probes a running frontend over HTTP
#[derive(Debug, Clone)]
pub struct ReadinessChecker {
    client: reqwest::Client,
    url: String,
    options: ReadinessOptions,
}

impl ReadinessChecker {
    /// Checker for `url`
    pub fn new(url: impl Into<String>, options: ReadinessOptions) -> ProbeResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(options.request_timeout)
            .build()
            .map_err(|e| ProbeError::invalid_config(format!("http client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
            options,
        })
    }

    /// URL being probed
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// GET the base URL, retrying a fixed number of times.
    ///
    /// Never fails: an unreachable target is a result with `ready = false`.
    pub async fn check_readiness(&self) -> ReadinessResult {
        let attempts = self.options.attempts.max(1);
        let mut last_error = String::new();
        for attempt in 1..=attempts {
            let start = tokio::time::Instant::now();
            match self.client.get(&self.url).send().await {
                Ok(response) if response.status().is_success() => {
                    let elapsed = start.elapsed();
                    tracing::info!(
                        url = %self.url,
                        attempt,
                        response_ms = elapsed.as_millis() as u64,
                        "frontend ready"
                    );
                    return ReadinessResult {
                        ready: true,
                        error: None,
                        response_time: Some(elapsed),
                        attempts: attempt,
                    };
                }
                Ok(response) => last_error = format!("HTTP {}", response.status()),
                Err(e) => last_error = e.to_string(),
            }
            tracing::warn!(
                url = %self.url,
                attempt,
                attempts,
                error = %last_error,
                "frontend not ready"
            );
            if attempt < attempts {
                tokio::time::sleep(self.options.retry_delay).await;
            }
        }
        ReadinessResult {
            ready: false,
            error: Some(last_error),
            response_time: None,
            attempts,
        }
    }

    /// Repeat [`check_readiness`](Self::check_readiness) until ready or `timeout` elapses.
    ///
    /// The deadline covers in-flight requests and retry pauses, so this returns
    /// within `timeout` even when every request hangs. `attempts` counts requests
    /// across all polls.
    pub async fn poll_ready(&self, timeout: Duration) -> ReadinessResult {
        let deadline = tokio::time::Instant::now() + timeout;
        let mut attempts = 0;
        let mut last_error = None;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                break;
            }
            match tokio::time::timeout(remaining, self.check_readiness()).await {
                Ok(result) if result.ready => {
                    return ReadinessResult {
                        attempts: attempts + result.attempts,
                        ..result
                    };
                }
                Ok(result) => {
                    attempts += result.attempts;
                    last_error = result.error;
                }
                Err(_) => {
                    attempts += 1;
                    last_error = Some(format!("no response within {}ms", timeout.as_millis()));
                    break;
                }
            }
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            tokio::time::sleep(self.options.poll_interval.min(remaining)).await;
        }
        tracing::error!(
            url = %self.url,
            timeout_ms = timeout.as_millis() as u64,
            attempts,
            "frontend never became ready"
        );
        ReadinessResult {
            ready: false,
            error: last_error.or_else(|| Some("no attempt fit in the wait".to_string())),
            response_time: None,
            attempts,
        }
    }

    /// Poll until ready or `timeout` elapses
    pub async fn wait_for_ready(&self, timeout: Duration) -> bool {
        self.poll_ready(timeout).await.ready
    }
}

/// Check that the query input and submit control are rendered.
///
/// Returns one message per missing control; empty means the interface is usable.
pub async fn validate_interface<P: PageHandle + ?Sized>(
    page: &P,
) -> ProbeResult<Vec<String>> {
    let mut errors = Vec::new();
    for chain in [query_input_chain(), submit_button_chain()] {
        match chain.first_visible(page).await? {
            Some(resolved) => {
                if !resolved.element.enabled {
                    tracing::warn!(
                        control = %chain.name,
                        selector = %resolved.selector,
                        "control is disabled"
                    );
                }
            }
            None => {
                let error = if chain.first_matching(page).await?.is_some() {
                    format!("{} is present but not visible", chain.name)
                } else {
                    format!("{} not found: {}", chain.name, chain.describe())
                };
                errors.push(error);
            }
        }
    }
    Ok(errors)
}
