//! Suite report: per-scenario results rendered as JSON, HTML, and JUnit XML.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::millis;
use crate::result::ProbeResult;

/// JSON report file name
pub const JSON_REPORT: &str = "report.json";

/// HTML report file name
pub const HTML_REPORT: &str = "report.html";

/// JUnit report file name
pub const JUNIT_REPORT: &str = "junit.xml";

/// Scenario outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    /// Passed on the first attempt
    Passed,
    /// Passed after at least one re-run
    Flaky,
    /// Failed every attempt
    Failed,
}

impl TestStatus {
    /// Counts as passing
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed | Self::Flaky)
    }

    /// Counts as failing
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }

    const fn css_class(self) -> &'static str {
        match self {
            Self::Passed => "pass",
            Self::Flaky => "flaky",
            Self::Failed => "fail",
        }
    }
}

/// Result of one scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResultEntry {
    /// Scenario name
    pub name: String,
    /// Outcome
    pub status: TestStatus,
    /// Duration of the final attempt
    #[serde(rename = "duration_ms", with = "millis")]
    pub duration: Duration,
    /// Attempts made
    pub attempts: u32,
    /// Error of the final failed attempt
    pub error: Option<String>,
    /// Screenshots captured
    #[serde(default)]
    pub screenshots: Vec<PathBuf>,
    /// HTML dump captured on failure
    #[serde(default)]
    pub page_dump: Option<PathBuf>,
    /// When the scenario finished
    pub finished_at: DateTime<Utc>,
}

impl TestResultEntry {
    /// Create a passing result
    #[must_use]
    pub fn passed(name: impl Into<String>, duration: Duration, attempts: u32) -> Self {
        Self {
            name: name.into(),
            status: if attempts > 1 {
                TestStatus::Flaky
            } else {
                TestStatus::Passed
            },
            duration,
            attempts,
            error: None,
            screenshots: Vec::new(),
            page_dump: None,
            finished_at: Utc::now(),
        }
    }

    /// Create a failing result
    #[must_use]
    pub fn failed(
        name: impl Into<String>,
        duration: Duration,
        attempts: u32,
        error: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            status: TestStatus::Failed,
            duration,
            attempts,
            error: Some(error.into()),
            screenshots: Vec::new(),
            page_dump: None,
            finished_at: Utc::now(),
        }
    }

    /// Attach screenshot paths
    #[must_use]
    pub fn with_screenshots(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.screenshots.extend(paths);
        self
    }

    /// Attach the page dump, if one was captured
    #[must_use]
    pub fn with_page_dump(mut self, path: Option<PathBuf>) -> Self {
        self.page_dump = path;
        self
    }
}

/// Results of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Suite name
    pub suite_name: String,
    /// Target URL
    pub base_url: String,
    /// Run start
    pub started_at: DateTime<Utc>,
    /// Run end, once finished
    pub finished_at: Option<DateTime<Utc>>,
    /// Per-scenario results
    pub results: Vec<TestResultEntry>,
}

impl SuiteReport {
    /// Start a report now
    #[must_use]
    pub fn new(suite_name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            suite_name: suite_name.into(),
            base_url: base_url.into(),
            started_at: Utc::now(),
            finished_at: None,
            results: Vec::new(),
        }
    }

    /// Record a result
    pub fn record(&mut self, result: TestResultEntry) {
        self.results.push(result);
    }

    /// Stamp the end time
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Passed or flaky scenarios
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.status.is_passed()).count()
    }

    /// Failed scenarios
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| r.status.is_failed()).count()
    }

    /// Scenarios that needed a re-run
    #[must_use]
    pub fn flaky_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == TestStatus::Flaky)
            .count()
    }

    /// Recorded scenarios
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.results.len()
    }

    /// Pass rate (0.0 to 1.0)
    #[must_use]
    pub fn pass_rate(&self) -> f64 {
        if self.results.is_empty() {
            return 1.0;
        }
        self.passed_count() as f64 / self.results.len() as f64
    }

    /// No scenario failed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed_count() == 0
    }

    /// Wall-clock duration of the run
    #[must_use]
    pub fn wall_time(&self) -> Duration {
        self.finished_at
            .and_then(|end| (end - self.started_at).to_std().ok())
            .unwrap_or_default()
    }

    /// Failed scenarios
    #[must_use]
    pub fn failures(&self) -> Vec<&TestResultEntry> {
        self.results
            .iter()
            .filter(|r| r.status.is_failed())
            .collect()
    }

    /// One-line summary
    #[must_use]
    pub fn summary(&self) -> String {
        let mut line = format!(
            "{}: {}/{} passed ({:.1}%)",
            self.suite_name,
            self.passed_count(),
            self.total_count(),
            self.pass_rate() * 100.0
        );
        let flaky = self.flaky_count();
        if flaky > 0 {
            line.push_str(&format!(", {flaky} flaky"));
        }
        line
    }

    /// Pretty JSON
    pub fn to_json(&self) -> ProbeResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Render the HTML report
    #[must_use]
    pub fn render_html(&self) -> String {
        let mut html = String::new();

        html.push_str(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>Decision Coach E2E Report</title>
    <style>
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            margin: 20px;
        }
        .summary { background: #f5f5f5; padding: 20px; border-radius: 8px; margin-bottom: 20px; }
        .progress-bar { background: #ddd; height: 20px; border-radius: 10px; overflow: hidden; }
        .passed { background: #4caf50; height: 100%; }
        .test { padding: 10px; margin: 5px 0; border-radius: 4px; }
        .test.pass { background: #e8f5e9; border-left: 4px solid #4caf50; }
        .test.flaky { background: #fffde7; border-left: 4px solid #fbc02d; }
        .test.fail { background: #ffebee; border-left: 4px solid #f44336; }
        .test.skip { background: #fff3e0; border-left: 4px solid #ff9800; }
        .error { color: #d32f2f; font-family: monospace; white-space: pre-wrap; }
        .artifacts a { margin-right: 10px; }
    </style>
</head>
<body>
"#,
        );

        html.push_str(&format!(
            r#"<div class="summary">
    <h1>{}</h1>
    <p>Target: <code>{}</code> &middot; started {}</p>
    <h2>Results: {}/{} passed ({:.1}%)</h2>
    <div class="progress-bar">
        <div class="passed" style="width: {:.1}%"></div>
    </div>
    <p>Duration: {:.2}s</p>
</div>
"#,
            escape_html(&self.suite_name),
            escape_html(&self.base_url),
            self.started_at.to_rfc3339(),
            self.passed_count(),
            self.total_count(),
            self.pass_rate() * 100.0,
            self.pass_rate() * 100.0,
            self.wall_time().as_secs_f64()
        ));

        html.push_str("<h2>Scenarios</h2>\n");
        for result in &self.results {
            html.push_str(&format!(
                r#"<div class="test {}">
    <strong>{}</strong> - {:?} ({:.2}s, {} attempt(s))
"#,
                result.status.css_class(),
                escape_html(&result.name),
                result.status,
                result.duration.as_secs_f64(),
                result.attempts
            ));
            if let Some(error) = &result.error {
                html.push_str(&format!(
                    "    <div class=\"error\">{}</div>\n",
                    escape_html(error)
                ));
            }
            let links: Vec<&PathBuf> = result
                .screenshots
                .iter()
                .chain(result.page_dump.iter())
                .collect();
            if !links.is_empty() {
                html.push_str("    <div class=\"artifacts\">");
                for path in links {
                    let shown = escape_html(&path.display().to_string());
                    html.push_str(&format!("<a href=\"{shown}\">{shown}</a>"));
                }
                html.push_str("</div>\n");
            }
            html.push_str("</div>\n");
        }

        html.push_str(
            r#"
<footer>
    <p>Generated by coach-probe</p>
</footer>
</body>
</html>
"#,
        );
        html
    }

    /// Render JUnit XML
    #[must_use]
    pub fn render_junit(&self) -> String {
        let mut xml = String::new();
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        xml.push_str(&format!(
            r#"<testsuite name="{}" tests="{}" failures="{}" time="{:.3}">"#,
            escape_html(&self.suite_name),
            self.total_count(),
            self.failed_count(),
            self.wall_time().as_secs_f64()
        ));
        xml.push('\n');
        for result in &self.results {
            xml.push_str(&format!(
                r#"  <testcase name="{}" time="{:.3}">"#,
                escape_html(&result.name),
                result.duration.as_secs_f64()
            ));
            xml.push('\n');
            if let (TestStatus::Failed, Some(error)) = (result.status, &result.error) {
                let error = escape_html(error);
                xml.push_str(&format!(r#"    <failure message="{error}">{error}</failure>"#));
                xml.push('\n');
            }
            xml.push_str("  </testcase>\n");
        }
        xml.push_str("</testsuite>\n");
        xml
    }

    /// Write `report.json`, `report.html`, and `junit.xml` into `dir`
    pub fn write(&self, dir: &Path) -> ProbeResult<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;
        let outputs = [
            (dir.join(JSON_REPORT), self.to_json()?),
            (dir.join(HTML_REPORT), self.render_html()),
            (dir.join(JUNIT_REPORT), self.render_junit()),
        ];
        let mut written = Vec::with_capacity(outputs.len());
        for (path, body) in outputs {
            std::fs::write(&path, body)?;
            written.push(path);
        }
        Ok(written)
    }
}

/// Escape HTML/XML special characters
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
