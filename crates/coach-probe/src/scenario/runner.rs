//! Runs selected scenarios, each on a fresh page, and collects a report.

use futures::stream::{self, StreamExt};
use std::path::PathBuf;
use std::time::Instant;

use super::{Scenario, ScenarioContext};
use crate::artifacts::ArtifactStore;
use crate::config::SuiteConfig;
use crate::page::{PageFactory, PageHandle};
use crate::readiness::ReadinessChecker;
use crate::report::{SuiteReport, TestResultEntry};
use crate::result::ProbeResult;
use crate::wait::with_timeout;

struct AttemptFailure {
    error: String,
    screenshot: Option<PathBuf>,
    page_dump: Option<PathBuf>,
}

/// Scenario executor with bounded concurrency and re-runs
#[derive(Debug)]
pub struct ScenarioRunner<F: PageFactory> {
    factory: F,
    config: SuiteConfig,
    artifacts: ArtifactStore,
    readiness: Option<ReadinessChecker>,
}

impl<F: PageFactory> ScenarioRunner<F> {
    /// Runner writing artifacts under `config.output_dir`
    pub fn new(factory: F, config: SuiteConfig) -> Self {
        let artifacts = ArtifactStore::new(config.output_dir.clone());
        Self {
            factory,
            config,
            artifacts,
            readiness: None,
        }
    }

    /// Probe the frontend over HTTP at the start of each scenario
    pub fn with_readiness_check(mut self) -> ProbeResult<Self> {
        self.readiness = Some(ReadinessChecker::new(
            self.config.base_url(),
            self.config.readiness,
        )?);
        Ok(self)
    }

    /// Run configuration
    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Artifact output
    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    /// Give back the page factory, e.g. to close the browser
    pub fn into_factory(self) -> F {
        self.factory
    }

    /// Scenarios run at once
    #[must_use]
    pub fn concurrency(&self, scenario_count: usize) -> usize {
        if self.config.workers == 0 {
            scenario_count.max(1)
        } else {
            self.config.workers
        }
    }

    /// Run `scenarios`; results keep the given order
    pub async fn run(&self, scenarios: &[Scenario]) -> SuiteReport {
        let mut report = SuiteReport::new("Decision Coach E2E", self.config.base_url());
        let workers = self.concurrency(scenarios.len());
        tracing::info!(
            scenarios = scenarios.len(),
            workers,
            retries = self.config.retries,
            "starting run"
        );

        let results: Vec<TestResultEntry> = stream::iter(scenarios.iter().copied())
            .map(|scenario| self.run_scenario(scenario))
            .buffered(workers)
            .collect()
            .await;
        for result in results {
            report.record(result);
        }
        report.finish();
        tracing::info!(summary = %report.summary(), "run finished");
        report
    }

    /// Run one scenario, re-running failures up to `config.retries` times
    pub async fn run_scenario(&self, scenario: Scenario) -> TestResultEntry {
        let max_attempts = self.config.retries.saturating_add(1);
        let mut attempt = 1;
        loop {
            let start = Instant::now();
            match self.attempt(scenario, attempt).await {
                Ok(screenshots) => {
                    tracing::info!(scenario = %scenario, attempt, "scenario passed");
                    return TestResultEntry::passed(scenario.name(), start.elapsed(), attempt)
                        .with_screenshots(screenshots);
                }
                Err(failure) if attempt >= max_attempts => {
                    tracing::error!(
                        scenario = %scenario,
                        attempt,
                        error = %failure.error,
                        "scenario failed"
                    );
                    return TestResultEntry::failed(
                        scenario.name(),
                        start.elapsed(),
                        attempt,
                        failure.error,
                    )
                    .with_screenshots(failure.screenshot)
                    .with_page_dump(failure.page_dump);
                }
                Err(failure) => {
                    tracing::warn!(
                        scenario = %scenario,
                        attempt,
                        max_attempts,
                        error = %failure.error,
                        "scenario failed, re-running"
                    );
                    attempt += 1;
                }
            }
        }
    }

    /// One attempt on a fresh page; the page is closed whatever the outcome
    async fn attempt(
        &self,
        scenario: Scenario,
        attempt: u32,
    ) -> Result<Vec<PathBuf>, AttemptFailure> {
        let page = self.factory.new_page().await.map_err(|e| AttemptFailure {
            error: e.to_string(),
            screenshot: None,
            page_dump: None,
        })?;
        let ctx = ScenarioContext::new(&page, &self.config, &self.artifacts, scenario.name())
            .with_readiness(self.readiness.as_ref());

        let run = with_timeout(scenario.name(), self.config.timeouts.test, scenario.run(&ctx));
        let outcome = match run.await {
            Ok(screenshots) => Ok(screenshots),
            Err(error) => {
                let suffix = format!("failure-attempt-{attempt}");
                let screenshot = self
                    .artifacts
                    .capture_screenshot(&page, scenario.name(), &suffix)
                    .await;
                let page_dump = self
                    .artifacts
                    .capture_page_dump(&page, scenario.name(), &suffix)
                    .await;
                Err(AttemptFailure {
                    error: error.to_string(),
                    screenshot,
                    page_dump,
                })
            }
        };
        if let Err(e) = page.close().await {
            tracing::warn!(scenario = %scenario, attempt, error = %e, "page did not close cleanly");
        }
        outcome
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::{MockPage, MockPageFactory};
    use crate::report::TestStatus;
    use crate::viewport::Viewport;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn config(dir: &std::path::Path) -> SuiteConfig {
        SuiteConfig::default().with_output_dir(dir)
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_scenarios_pass_on_healthy_page() {
        let dir = tempfile::tempdir().unwrap();
        let factory = MockPageFactory::new(|| MockPage::decision_coach(Viewport::default()));
        let runner = ScenarioRunner::new(factory, config(dir.path()));
        let report = runner.run(&Scenario::ALL).await;
        assert_eq!(report.total_count(), 6);
        assert!(report.all_passed(), "{:?}", report.failures());
        assert_eq!(report.results[0].name, "basic_rendering");
        assert!(dir.path().join("screenshots/basic_rendering-success.png").exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_captures_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let factory = MockPageFactory::new(|| MockPage::new(Viewport::default()));
        let runner = ScenarioRunner::new(factory, config(dir.path()));
        let entry = runner.run_scenario(Scenario::LayoutDefault).await;
        assert_eq!(entry.status, TestStatus::Failed);
        assert_eq!(entry.attempts, 1);
        assert_eq!(entry.screenshots.len(), 1);
        assert!(entry.page_dump.unwrap().exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_flaky_scenario_passes_on_rerun() {
        let dir = tempfile::tempdir().unwrap();
        let pages = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&pages);
        let factory = MockPageFactory::new(move || {
            // first page has no layout wrapper at all
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                MockPage::new(Viewport::default())
            } else {
                MockPage::decision_coach(Viewport::default())
            }
        });
        let runner = ScenarioRunner::new(factory, config(dir.path()).with_retries(1));
        let entry = runner.run_scenario(Scenario::LayoutDefault).await;
        assert_eq!(entry.status, TestStatus::Flaky);
        assert_eq!(entry.attempts, 2);
        assert_eq!(pages.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_exhausted() {
        let dir = tempfile::tempdir().unwrap();
        let factory = MockPageFactory::new(|| MockPage::new(Viewport::default()));
        let runner = ScenarioRunner::new(factory, config(dir.path()).with_retries(2));
        let entry = runner.run_scenario(Scenario::LayoutDefault).await;
        assert_eq!(entry.status, TestStatus::Failed);
        assert_eq!(entry.attempts, 3);
        assert!(dir
            .path()
            .join("screenshots/layout_default-failure-attempt-3.png")
            .exists());
    }

    fn recording_factory(
        build: fn() -> MockPage,
    ) -> (
        MockPageFactory<impl Fn() -> MockPage + Send + Sync>,
        Arc<Mutex<Vec<MockPage>>>,
    ) {
        let pages = Arc::new(Mutex::new(Vec::new()));
        let created = Arc::clone(&pages);
        let factory = MockPageFactory::new(move || {
            let page = build();
            created.lock().unwrap().push(page.clone());
            page
        });
        (factory, pages)
    }

    #[tokio::test(start_paused = true)]
    async fn test_pages_closed_after_pass() {
        let dir = tempfile::tempdir().unwrap();
        let (factory, pages) =
            recording_factory(|| MockPage::decision_coach(Viewport::default()));
        let runner = ScenarioRunner::new(factory, config(dir.path()));
        let report = runner.run(&Scenario::ALL).await;
        assert!(report.all_passed());
        let pages = pages.lock().unwrap();
        assert_eq!(pages.len(), 6);
        assert!(pages.iter().all(MockPage::is_closed));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pages_closed_after_each_failed_attempt() {
        let dir = tempfile::tempdir().unwrap();
        let (factory, pages) = recording_factory(|| MockPage::new(Viewport::default()));
        let runner = ScenarioRunner::new(factory, config(dir.path()).with_retries(2));
        let entry = runner.run_scenario(Scenario::LayoutDefault).await;
        assert_eq!(entry.status, TestStatus::Failed);
        let pages = pages.lock().unwrap();
        assert_eq!(pages.len(), 3);
        assert!(pages.iter().all(MockPage::is_closed));
    }

    #[test]
    fn test_concurrency() {
        let factory = MockPageFactory::new(|| MockPage::new(Viewport::default()));
        let runner = ScenarioRunner::new(factory, SuiteConfig::default());
        assert_eq!(runner.concurrency(6), 6);
        assert_eq!(runner.concurrency(0), 1);
        let factory = MockPageFactory::new(|| MockPage::new(Viewport::default()));
        let runner = ScenarioRunner::new(factory, SuiteConfig::default().with_ci());
        assert_eq!(runner.concurrency(6), 1);
    }
}
