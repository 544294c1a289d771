//! Output formatting and progress reporting

use coach_probe::{SuiteReport, TestResultEntry, TestStatus};
use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Output format for run results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text on stderr
    #[default]
    Text,
    /// Suite report as JSON on stdout
    Json,
}

/// Progress reporter for scenario execution
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    spinner: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            spinner: None,
            use_color,
            quiet,
        }
    }

    /// Show a spinner while scenarios run
    pub fn start_spinner(&mut self, message: &str) {
        if self.quiet || !self.term.is_term() {
            return;
        }

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(120));
        self.spinner = Some(spinner);
    }

    /// Clear the spinner
    pub fn finish(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = self.prefix("✓", "PASS", &Style::new().green().bold());
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // failures print even in quiet mode
        let prefix = self.prefix("✗", "FAIL", &Style::new().red().bold());
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = self.prefix("⚠", "WARN", &Style::new().yellow().bold());
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = self.prefix("ℹ", "INFO", &Style::new().blue().bold());
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }

        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };

        let _ = self.term.write_line("");
        let _ = self.term.write_line(&styled);
    }

    /// Print one line per scenario result
    pub fn result(&self, entry: &TestResultEntry) {
        let line = format_entry(entry);
        match entry.status {
            TestStatus::Passed => self.success(&line),
            TestStatus::Flaky => self.warning(&line),
            TestStatus::Failed => {
                self.failure(&line);
                for shot in &entry.screenshots {
                    self.failure(&format!("    screenshot: {}", shot.display()));
                }
                if let Some(dump) = &entry.page_dump {
                    self.failure(&format!("    page: {}", dump.display()));
                }
            }
        }
    }

    /// Print the run summary
    pub fn summary(&self, report: &SuiteReport) {
        let failed = report.failed_count();
        if self.quiet && failed == 0 {
            return;
        }

        let _ = self.term.write_line("");
        let text = format_summary(report);
        let line = if self.use_color {
            let status = if failed > 0 {
                Style::new().red().bold().apply_to("FAILED")
            } else {
                Style::new().green().bold().apply_to("PASSED")
            };
            format!("{status} {text}")
        } else {
            let status = if failed > 0 { "FAILED" } else { "PASSED" };
            format!("{status} {text}")
        };
        let _ = self.term.write_line(&line);
    }

    fn prefix(&self, symbol: &str, word: &str, styling: &Style) -> String {
        if self.use_color {
            styling.apply_to(symbol).to_string()
        } else {
            word.to_string()
        }
    }
}

/// `name (1.23s)` plus attempts and the error when relevant
#[must_use]
pub fn format_entry(entry: &TestResultEntry) -> String {
    let mut line = format!("{} ({:.2}s)", entry.name, entry.duration.as_secs_f64());
    if entry.attempts > 1 {
        line.push_str(&format!(" after {} attempts", entry.attempts));
    }
    if let Some(error) = &entry.error {
        line.push_str(&format!(": {error}"));
    }
    line
}

/// `N scenarios in 1.23s (…)`
#[must_use]
pub fn format_summary(report: &SuiteReport) -> String {
    format!(
        "{} scenarios in {:.2}s ({})",
        report.total_count(),
        report.wall_time().as_secs_f64(),
        report.summary()
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn report() -> SuiteReport {
        let mut report = SuiteReport::new("Decision Coach E2E", "http://localhost:3000");
        report.record(TestResultEntry::passed("basic_rendering", Duration::from_millis(1500), 1));
        report.record(TestResultEntry::passed("layout_default", Duration::from_millis(200), 2));
        report.record(TestResultEntry::failed(
            "error_states",
            Duration::from_millis(900),
            3,
            "Assertion failed: query input disabled",
        ));
        report.finish();
        report
    }

    mod format_tests {
        use super::*;

        #[test]
        fn test_default_format() {
            assert_eq!(OutputFormat::default(), OutputFormat::Text);
        }

        #[test]
        fn test_format_passed_entry() {
            let entry = TestResultEntry::passed("basic_rendering", Duration::from_millis(1500), 1);
            assert_eq!(format_entry(&entry), "basic_rendering (1.50s)");
        }

        #[test]
        fn test_format_failed_entry() {
            let report = report();
            let line = format_entry(&report.results[2]);
            assert!(line.starts_with("error_states (0.90s) after 3 attempts"));
            assert!(line.ends_with("query input disabled"));
        }

        #[test]
        fn test_format_summary() {
            let summary = format_summary(&report());
            assert!(summary.starts_with("3 scenarios in"));
            assert!(summary.contains("1 flaky"));
        }
    }

    mod progress_reporter_tests {
        use super::*;

        #[test]
        fn test_new_reporter() {
            let reporter = ProgressReporter::new(true, false);
            assert!(reporter.use_color);
            assert!(!reporter.quiet);
        }

        #[test]
        fn test_default_reporter() {
            let reporter = ProgressReporter::default();
            assert!(reporter.use_color);
        }

        #[test]
        fn test_messages_do_not_panic() {
            let reporter = ProgressReporter::new(false, false);
            reporter.success("passed");
            reporter.failure("failed");
            reporter.warning("flaky");
            reporter.info("waiting for frontend");
            reporter.header("Scenarios");
        }

        #[test]
        fn test_results_and_summary() {
            let reporter = ProgressReporter::new(false, false);
            let report = report();
            for entry in &report.results {
                reporter.result(entry);
            }
            reporter.summary(&report);
        }

        #[test]
        fn test_spinner_lifecycle() {
            let mut reporter = ProgressReporter::new(false, false);
            reporter.start_spinner("running");
            reporter.finish();
            assert!(reporter.spinner.is_none());
        }

        #[test]
        fn test_quiet_mode_skips_spinner() {
            let mut reporter = ProgressReporter::new(false, true);
            reporter.start_spinner("running");
            assert!(reporter.spinner.is_none());
            reporter.failure("still shown");
        }
    }
}
