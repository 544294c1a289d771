//! Result and error types for coach-probe.
//!
//! Only infrastructure failures travel through [`ProbeError`]. Content-quality
//! problems are reported as validation result values by the validators.

use thiserror::Error;

/// Result type for coach-probe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Errors that can occur while driving or inspecting the application under test
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunchError {
        /// Error message
        message: String,
    },

    /// Page error
    #[error("Page error: {message}")]
    PageError {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    NavigationError {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Operation timed out
    #[error("{operation} timed out after {ms}ms")]
    Timeout {
        /// What was being waited for
        operation: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Script evaluation inside the page failed
    #[error("Script evaluation failed: {message}")]
    EvaluationError {
        /// Error message
        message: String,
    },

    /// No candidate selector resolved to a usable element
    #[error("Element not found: {description}")]
    ElementNotFound {
        /// Which element, and which selectors were tried
        description: String,
    },

    /// Input simulation error
    #[error("Input simulation failed: {message}")]
    InputError {
        /// Error message
        message: String,
    },

    /// Screenshot error
    #[error("Screenshot failed: {message}")]
    ScreenshotError {
        /// Error message
        message: String,
    },

    /// Neither the layout wrapper nor the document body produced a bounding box
    #[error("Layout unavailable: {message}")]
    LayoutUnavailable {
        /// Error message
        message: String,
    },

    /// Assertion failed
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// All retry attempts were used up
    #[error("{operation} failed after {attempts} attempt(s): {message}")]
    RetryExhausted {
        /// Operation name
        operation: String,
        /// Attempts made
        attempts: u32,
        /// Final attempt's error
        message: String,
    },

    /// Invalid configuration value
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl ProbeError {
    /// Create an assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Create a page error
    #[must_use]
    pub fn page(message: impl Into<String>) -> Self {
        Self::PageError {
            message: message.into(),
        }
    }

    /// Create an invalid configuration error
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Whether this error describes broken infrastructure rather than a failed assertion
    #[must_use]
    pub const fn is_infrastructure(&self) -> bool {
        !matches!(self, Self::AssertionFailed { .. })
    }
}
