//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// At least one scenario failed
    #[error("{failed} of {total} scenarios failed")]
    ScenariosFailed {
        /// Failed scenarios
        failed: usize,
        /// Scenarios run
        total: usize,
    },

    /// Frontend never became ready
    #[error("Frontend not ready at {url}: {message}")]
    NotReady {
        /// Probed URL
        url: String,
        /// Last probe error
        message: String,
    },

    /// Feature compiled out
    #[error("{0}")]
    Unsupported(String),

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Library error
    #[error("{0}")]
    Probe(#[from] coach_probe::ProbeError),
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a not-ready error
    #[must_use]
    pub fn not_ready(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotReady {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Process exit code for this error
    ///
    /// 1 for failing scenarios, 2 for anything that stopped the run early.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::ScenariosFailed { .. } => 1,
            _ => 2,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let err = CliError::config("bad config");
        assert!(err.to_string().contains("Configuration"));
        assert!(err.to_string().contains("bad config"));
    }

    #[test]
    fn test_invalid_argument_error() {
        let err = CliError::invalid_argument("--only is not allowed in CI");
        assert!(err.to_string().contains("--only"));
    }

    #[test]
    fn test_scenarios_failed_message() {
        let err = CliError::ScenariosFailed { failed: 2, total: 6 };
        assert_eq!(err.to_string(), "2 of 6 scenarios failed");
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_not_ready_exit_code() {
        let err = CliError::not_ready("http://localhost:3000", "connection refused");
        assert!(err.to_string().contains("localhost:3000"));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_from_probe_error() {
        let err: CliError =
            coach_probe::ProbeError::invalid_config("retry.attempts must be at least 1").into();
        assert!(err.to_string().contains("retry.attempts"));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: CliError = io.into();
        assert!(err.to_string().contains("I/O"));
    }
}
