//! Suite configuration.
//!
//! Layered, later wins: defaults, an optional YAML file, environment
//! (`COACH_BASE_URL`, `COACH_OUTPUT_DIR`, `CI`), then CLI flags applied by the
//! caller.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::browser::BrowserConfig;
use crate::layout::LayoutTolerance;
use crate::readiness::ReadinessOptions;
use crate::result::{ProbeError, ProbeResult};
use crate::retry::RetryOptions;
use crate::validators::ValidationPolicy;

/// Environment variable overriding the base URL
pub const ENV_BASE_URL: &str = "COACH_BASE_URL";

/// Environment variable overriding the output directory
pub const ENV_OUTPUT_DIR: &str = "COACH_OUTPUT_DIR";

/// Environment flag switching on CI settings
pub const ENV_CI: &str = "CI";

/// Serde adapter storing a `Duration` as integer milliseconds
pub mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    /// Serialize as milliseconds
    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    /// Deserialize from milliseconds
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

/// Independent deadlines per operation class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Page navigation
    #[serde(with = "millis")]
    pub navigation: Duration,
    /// Waiting for an interactive element
    #[serde(with = "millis")]
    pub element: Duration,
    /// Waiting for a submitted query's response to render
    #[serde(with = "millis")]
    pub response: Duration,
    /// Whole scenario
    #[serde(with = "millis")]
    pub test: Duration,
    /// Poll interval for element and response waits
    #[serde(with = "millis")]
    pub poll_interval: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            navigation: Duration::from_secs(30),
            element: Duration::from_secs(10),
            response: Duration::from_secs(60),
            test: Duration::from_secs(180),
            poll_interval: Duration::from_millis(crate::wait::DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

/// Complete configuration for one run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Root URL of the Decision Coach frontend
    pub base_url: String,
    /// Where screenshots, page dumps, and reports go
    pub output_dir: PathBuf,
    /// Browser launch settings
    pub browser: BrowserConfig,
    /// Scenarios run concurrently (0 = one per scenario)
    pub workers: usize,
    /// Re-runs of a failed scenario
    pub retries: u32,
    /// Running under CI
    pub ci: bool,
    /// Reject focused (`--only`) runs
    pub forbid_only: bool,
    /// Operation deadlines
    pub timeouts: Timeouts,
    /// Content thresholds
    pub validation: ValidationPolicy,
    /// Centering tolerances
    pub layout: LayoutTolerance,
    /// Backoff for flaky steps inside scenarios
    pub retry: RetryOptions,
    /// HTTP readiness polling
    pub readiness: ReadinessOptions,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            output_dir: PathBuf::from("target/coach-probe"),
            browser: BrowserConfig::default(),
            workers: 0,
            retries: 0,
            ci: false,
            forbid_only: false,
            timeouts: Timeouts::default(),
            validation: ValidationPolicy::default(),
            layout: LayoutTolerance::default(),
            retry: RetryOptions::default(),
            readiness: ReadinessOptions::default(),
        }
    }
}

impl SuiteConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse YAML; missing keys keep their defaults
    pub fn from_yaml_str(yaml: &str) -> ProbeResult<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Load a YAML config file
    pub fn load(path: &Path) -> ProbeResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Apply environment overrides read through `lookup`
    #[must_use]
    pub fn apply_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            self.base_url = url.trim().to_string();
        }
        if let Some(dir) = lookup(ENV_OUTPUT_DIR).filter(|v| !v.trim().is_empty()) {
            self.output_dir = PathBuf::from(dir);
        }
        let ci = lookup(ENV_CI).is_some_and(|v| {
            let v = v.trim().to_ascii_lowercase();
            !(v.is_empty() || v == "0" || v == "false")
        });
        if ci {
            self = self.with_ci();
        }
        self
    }

    /// Apply overrides from the process environment
    #[must_use]
    pub fn from_env(self) -> Self {
        self.apply_env(|key| std::env::var(key).ok())
    }

    /// Stricter CI settings: serial execution, forced retries, no focused runs
    #[must_use]
    pub fn with_ci(mut self) -> Self {
        self.ci = true;
        self.workers = 1;
        self.retries = self.retries.max(2);
        self.forbid_only = true;
        self
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the output directory
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set worker count
    #[must_use]
    pub const fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set scenario re-runs
    #[must_use]
    pub const fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Base URL without a trailing slash
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> ProbeResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ProbeError::invalid_config(format!(
                "base_url must be an http(s) URL, got {:?}",
                self.base_url
            )));
        }
        if self.readiness.attempts == 0 {
            return Err(ProbeError::invalid_config("readiness.attempts must be at least 1"));
        }
        self.retry.validate()
    }
}
