//! Scenario bodies and the shared steps they are built from.

use std::fmt;
use std::path::PathBuf;

use crate::artifacts::ArtifactStore;
use crate::config::SuiteConfig;
use crate::layout::{check_centering, check_stability, sweep_viewports};
use crate::locator::{Selector, SelectorChain};
use crate::page::PageHandle;
use crate::readiness::{
    query_input_chain, submit_button_chain, validate_interface, ReadinessChecker,
};
use crate::result::{ProbeError, ProbeResult};
use crate::retry::{with_retry_capturing, RetryError};
use crate::validators::{
    default_sections, validate_all_sections, validate_tooltips_with, AllSectionsResult,
};
use crate::viewport::Viewport;
use crate::wait::{wait_until, with_timeout};

/// Query used by the rendering and layout scenarios
pub const PRIMARY_QUERY: &str = "I've been offered a job in another city with a 20% raise, \
    but I was just promoted at my current company. Should I take the new offer?";

/// Query types exercised by the multiple-queries scenario
pub const QUERY_SET: [(&str, &str); 4] = [
    (
        "career",
        "Should I leave my stable engineering job to join an early-stage startup \
         as a founding engineer?",
    ),
    (
        "financial",
        "Should I pay off my student loans early or invest the extra money in index funds?",
    ),
    (
        "relationship",
        "My partner wants to move in together after six months of dating. \
         How should I think about it?",
    ),
    (
        "relocation",
        "Should I move from New York to Austin for a lower cost of living \
         even though my family is here?",
    ),
];

const OVERLONG_QUERY_CHARS: usize = 5000;

/// Viewports the dynamic-stability scenario measures at, narrow first
#[must_use]
pub fn stability_viewports() -> [Viewport; 2] {
    [
        Viewport::new(375, 667, "Mobile"),
        Viewport::new(1366, 768, "Desktop Standard"),
    ]
}

/// Everything a scenario needs: its own page plus shared read-only settings
pub struct ScenarioContext<'a, P: PageHandle + ?Sized> {
    page: &'a P,
    config: &'a SuiteConfig,
    artifacts: &'a ArtifactStore,
    readiness: Option<&'a ReadinessChecker>,
    name: String,
}

impl<P: PageHandle + ?Sized> fmt::Debug for ScenarioContext<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioContext")
            .field("name", &self.name)
            .field("base_url", &self.config.base_url())
            .field("artifacts", &self.artifacts)
            .field("readiness", &self.readiness.map(ReadinessChecker::url))
            .finish_non_exhaustive()
    }
}

impl<'a, P: PageHandle + ?Sized> ScenarioContext<'a, P> {
    /// Context for scenario `name`
    pub fn new(
        page: &'a P,
        config: &'a SuiteConfig,
        artifacts: &'a ArtifactStore,
        name: impl Into<String>,
    ) -> Self {
        Self {
            page,
            config,
            artifacts,
            readiness: None,
            name: name.into(),
        }
    }

    /// Probe the frontend over HTTP before navigating
    #[must_use]
    pub fn with_readiness(mut self, checker: Option<&'a ReadinessChecker>) -> Self {
        self.readiness = checker;
        self
    }

    /// The scenario's page
    pub fn page(&self) -> &'a P {
        self.page
    }

    /// Run configuration
    pub fn config(&self) -> &'a SuiteConfig {
        self.config
    }

    /// Fail fast when the frontend is not answering
    pub async fn ensure_ready(&self) -> ProbeResult<()> {
        let Some(checker) = self.readiness else {
            return Ok(());
        };
        let result = checker.check_readiness().await;
        if result.ready {
            Ok(())
        } else {
            Err(ProbeError::NavigationError {
                url: checker.url().to_string(),
                message: format!(
                    "frontend not ready after {} attempt(s): {}",
                    result.attempts,
                    result.error.unwrap_or_default()
                ),
            })
        }
    }

    /// Navigate to the base URL and wait for the query controls
    pub async fn open(&self) -> ProbeResult<()> {
        let page = self.page;
        let url = self.config.base_url();
        with_timeout("navigation", self.config.timeouts.navigation, page.goto(url)).await?;
        let waited = wait_until(
            "query controls",
            self.config.timeouts.element,
            self.config.timeouts.poll_interval,
            move || async move { Ok(validate_interface(page).await?.is_empty()) },
        )
        .await;
        match waited {
            Ok(_) => Ok(()),
            Err(ProbeError::Timeout { .. }) => Err(ProbeError::ElementNotFound {
                description: validate_interface(self.page).await?.join("; "),
            }),
            Err(e) => Err(e),
        }
    }

    /// Type `query` into the input and click submit
    pub async fn submit_query(&self, query: &str) -> ProbeResult<()> {
        let input = self.resolve(&query_input_chain()).await?;
        self.page.fill(&input, query).await?;
        let submit = self.resolve(&submit_button_chain()).await?;
        self.page.click(&submit).await?;
        tracing::debug!(
            scenario = %self.name,
            query_chars = query.chars().count(),
            "query submitted"
        );
        Ok(())
    }

    /// Wait until the first required section is visible
    pub async fn wait_for_response(&self) -> ProbeResult<()> {
        let sections = default_sections();
        let chain = sections
            .iter()
            .find(|s| s.required)
            .map(|s| s.chain())
            .unwrap_or_else(|| SelectorChain::new("response", Vec::new()));
        let chain = &chain;
        let page = self.page;
        wait_until(
            "response render",
            self.config.timeouts.response,
            self.config.timeouts.poll_interval,
            move || async move { Ok(chain.first_visible(page).await?.is_some()) },
        )
        .await?;
        Ok(())
    }

    /// Wait for the layout wrapper to mount before measuring
    pub async fn wait_for_wrapper(&self) -> ProbeResult<()> {
        crate::layout::wait_for_wrapper(
            self.page,
            self.config.timeouts.element,
            self.config.timeouts.poll_interval,
        )
        .await
    }

    /// Validate every section, retrying while content is still streaming in.
    ///
    /// The first failing section becomes the scenario failure, prefixed with the
    /// operation and attempt count.
    pub async fn validate_response(&self) -> ProbeResult<AllSectionsResult> {
        let specs = default_sections();
        let specs = specs.as_slice();
        let page = self.page;
        let policy = &self.config.validation;
        let operation = format!("{} sections", self.name);
        with_retry_capturing(
            page,
            self.artifacts,
            &operation,
            &self.config.retry,
            move |_| async move {
                let result = validate_all_sections(page, specs, policy).await?;
                match result.first_failure().and_then(|s| s.error.clone()) {
                    Some(error) => Err(ProbeError::assertion(error)),
                    None => Ok(result),
                }
            },
        )
        .await
        .map_err(
            |RetryError {
                 operation,
                 attempts,
                 last_error,
             }| match last_error {
                ProbeError::AssertionFailed { message } => ProbeError::assertion(format!(
                    "{operation} failed after {attempts} attempt(s): {message}"
                )),
                last_error => ProbeError::from(RetryError {
                    operation,
                    attempts,
                    last_error,
                }),
            },
        )
    }

    /// Save a screenshot under this scenario's name
    pub async fn capture(&self, suffix: &str) -> Option<PathBuf> {
        self.artifacts
            .capture_screenshot(self.page, &self.name, suffix)
            .await
    }

    async fn resolve(&self, chain: &SelectorChain) -> ProbeResult<Selector> {
        chain
            .first_visible(self.page)
            .await?
            .map(|resolved| resolved.selector)
            .ok_or_else(|| ProbeError::ElementNotFound {
                description: chain.describe(),
            })
    }
}

pub(super) async fn basic_rendering<P: PageHandle + ?Sized>(
    ctx: &ScenarioContext<'_, P>,
) -> ProbeResult<Vec<PathBuf>> {
    ctx.ensure_ready().await?;
    ctx.open().await?;
    ctx.submit_query(PRIMARY_QUERY).await?;
    ctx.wait_for_response().await?;
    let sections = ctx.validate_response().await?;
    let tooltips = validate_tooltips_with(ctx.page(), &ctx.config().validation).await?;
    if !tooltips.valid {
        return Err(ProbeError::assertion(format!(
            "tooltips invalid ({}/{} valid): {}",
            tooltips.valid_tooltip_count,
            tooltips.tooltip_count,
            tooltips.errors.join("; ")
        )));
    }
    tracing::info!(
        sections = sections.sections.iter().filter(|s| !s.skipped).count(),
        tooltips = tooltips.tooltip_count,
        "response rendered"
    );
    Ok(ctx.capture("success").await.into_iter().collect())
}

pub(super) async fn multiple_queries<P: PageHandle + ?Sized>(
    ctx: &ScenarioContext<'_, P>,
) -> ProbeResult<Vec<PathBuf>> {
    ctx.ensure_ready().await?;
    let mut failures = Vec::new();
    for (kind, query) in QUERY_SET {
        ctx.open().await?;
        ctx.submit_query(query).await?;
        let outcome = match ctx.wait_for_response().await {
            Ok(()) => ctx.validate_response().await.map(|_| ()),
            Err(e) => Err(e),
        };
        match outcome {
            Ok(()) => tracing::info!(kind, "query type rendered"),
            Err(ProbeError::AssertionFailed { message }) => {
                failures.push(format!("{kind}: {message}"));
            }
            Err(e @ ProbeError::Timeout { .. }) => failures.push(format!("{kind}: {e}")),
            Err(e) => return Err(e),
        }
    }
    if failures.is_empty() {
        Ok(Vec::new())
    } else {
        Err(ProbeError::assertion(failures.join("; ")))
    }
}

pub(super) async fn error_states<P: PageHandle + ?Sized>(
    ctx: &ScenarioContext<'_, P>,
) -> ProbeResult<Vec<PathBuf>> {
    let overlong = "Should I take the job? ".repeat(OVERLONG_QUERY_CHARS / 23 + 1);
    let cases = [
        ("empty", String::new()),
        ("whitespace-only", "   \n\t  ".to_string()),
        ("over-long", overlong),
    ];
    ctx.ensure_ready().await?;
    for (case, query) in &cases {
        ctx.open().await?;
        ctx.submit_query(query).await?;
        tokio::time::sleep(ctx.config().timeouts.poll_interval).await;

        match query_input_chain().first_visible(ctx.page()).await? {
            Some(input) if input.element.enabled => {
                tracing::info!(case, "input still usable");
            }
            Some(_) => {
                return Err(ProbeError::assertion(format!(
                    "query input disabled after {case} query"
                )))
            }
            None => {
                return Err(ProbeError::assertion(format!(
                    "query input not visible after {case} query"
                )))
            }
        }
    }
    Ok(Vec::new())
}

pub(super) async fn layout_default<P: PageHandle + ?Sized>(
    ctx: &ScenarioContext<'_, P>,
) -> ProbeResult<Vec<PathBuf>> {
    ctx.ensure_ready().await?;
    ctx.page().set_viewport(&ctx.config().browser.viewport()).await?;
    ctx.open().await?;
    ctx.wait_for_wrapper().await?;
    let measurement = check_centering(ctx.page(), &ctx.config().layout).await?;
    tracing::info!(offset = measurement.offset, "default viewport centered");
    Ok(ctx.capture("centered").await.into_iter().collect())
}

pub(super) async fn layout_viewport_sweep<P: PageHandle + ?Sized>(
    ctx: &ScenarioContext<'_, P>,
) -> ProbeResult<Vec<PathBuf>> {
    ctx.ensure_ready().await?;
    let results = sweep_viewports(
        ctx.page(),
        ctx.config().base_url(),
        &Viewport::sweep(),
        &ctx.config().layout,
        &ctx.config().timeouts,
    )
    .await?;
    let worst = results
        .iter()
        .map(|r| r.measurement.offset)
        .fold(0.0_f64, f64::max);
    tracing::info!(viewports = results.len(), worst_offset = worst, "sweep centered");
    ctx.page().set_viewport(&ctx.config().browser.viewport()).await?;
    Ok(Vec::new())
}

pub(super) async fn layout_dynamic_stability<P: PageHandle + ?Sized>(
    ctx: &ScenarioContext<'_, P>,
) -> ProbeResult<Vec<PathBuf>> {
    ctx.ensure_ready().await?;
    let mut failures = Vec::new();
    for viewport in stability_viewports() {
        ctx.page().set_viewport(&viewport).await?;
        ctx.open().await?;
        ctx.wait_for_wrapper().await?;
        let outcome = check_stability(ctx.page(), &ctx.config().layout, move || async move {
            ctx.submit_query(PRIMARY_QUERY).await?;
            ctx.wait_for_response().await
        })
        .await;
        match outcome {
            Ok(report) => tracing::info!(
                viewport = %viewport,
                before = report.before.offset,
                after = report.after.offset,
                delta = report.delta,
                "layout stable"
            ),
            Err(ProbeError::AssertionFailed { message }) => {
                failures.push(format!("{viewport}: {message}"));
            }
            Err(e) => return Err(e),
        }
    }
    let shot = ctx.capture("after-response").await;
    ctx.page().set_viewport(&ctx.config().browser.viewport()).await?;
    if failures.is_empty() {
        Ok(shot.into_iter().collect())
    } else {
        Err(ProbeError::assertion(failures.join("; ")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::{decision_coach_response, MockElement, MockPage};
    use crate::scenario::Scenario;

    fn setup() -> (tempfile::TempDir, SuiteConfig, ArtifactStore) {
        let dir = tempfile::tempdir().unwrap();
        let config = SuiteConfig::default().with_output_dir(dir.path());
        let artifacts = ArtifactStore::new(dir.path());
        (dir, config, artifacts)
    }

    async fn run(scenario: Scenario, page: &MockPage) -> ProbeResult<Vec<PathBuf>> {
        let (_dir, config, artifacts) = setup();
        let ctx = ScenarioContext::new(page, &config, &artifacts, scenario.name());
        scenario.run(&ctx).await
    }

    mod rendering {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_basic_rendering_passes() {
            let page = MockPage::decision_coach(Viewport::default());
            let shots = run(Scenario::BasicRendering, &page).await.unwrap();
            assert_eq!(shots.len(), 1);
            assert_eq!(page.submitted(), vec![PRIMARY_QUERY.to_string()]);
        }

        #[tokio::test(start_paused = true)]
        async fn test_placeholder_section_fails_after_retries() {
            let mut response = decision_coach_response();
            response[0] = MockElement::new("[data-testid=\"summary-section\"]").with_text(
                "Summary\nLoading... please wait while we analyze your decision in detail",
            );
            let page = MockPage::decision_coach(Viewport::default()).with_response(response);
            let err = run(Scenario::BasicRendering, &page).await.unwrap_err();
            assert!(matches!(err, ProbeError::AssertionFailed { .. }));
            let message = err.to_string();
            assert!(message.contains("basic_rendering sections failed after 3 attempt(s)"));
            assert!(message.contains("Summary contains placeholder"));
            assert_eq!(page.screenshots_taken(), 3);
        }

        #[tokio::test(start_paused = true)]
        async fn test_missing_tooltips_fail() {
            let response = decision_coach_response().into_iter().take(4).collect();
            let page = MockPage::decision_coach(Viewport::default()).with_response(response);
            let err = run(Scenario::BasicRendering, &page).await.unwrap_err();
            assert!(err.to_string().contains("tooltips invalid (0/0 valid)"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_missing_controls_is_element_error() {
            let page = MockPage::new(Viewport::default());
            let err = run(Scenario::BasicRendering, &page).await.unwrap_err();
            assert!(matches!(err, ProbeError::ElementNotFound { .. }));
        }

        #[tokio::test(start_paused = true)]
        async fn test_unrendered_response_times_out() {
            let page = MockPage::decision_coach(Viewport::default()).with_response(Vec::new());
            let err = run(Scenario::BasicRendering, &page).await.unwrap_err();
            assert!(matches!(err, ProbeError::Timeout { .. }));
        }

        #[tokio::test(start_paused = true)]
        async fn test_multiple_queries_submit_each_type() {
            let page = MockPage::decision_coach(Viewport::default());
            run(Scenario::MultipleQueries, &page).await.unwrap();
            assert_eq!(page.submitted().len(), QUERY_SET.len());
            assert_eq!(page.navigations(), QUERY_SET.len());
        }
    }

    mod error_state {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_input_remains_usable() {
            let page = MockPage::decision_coach(Viewport::default());
            run(Scenario::ErrorStates, &page).await.unwrap();
            // only the over-long query is non-blank
            assert_eq!(page.submitted().len(), 1);
            assert!(page.submitted()[0].chars().count() >= OVERLONG_QUERY_CHARS);
        }

        #[tokio::test(start_paused = true)]
        async fn test_disabled_input_fails() {
            let page = MockPage::new(Viewport::default())
                .with_element(MockElement::new("textarea").disabled())
                .with_element(MockElement::new("button[type=\"submit\"]"));
            let err = run(Scenario::ErrorStates, &page).await.unwrap_err();
            assert!(matches!(err, ProbeError::InputError { .. }));
        }
    }

    mod layout {
        use super::*;
        use crate::mock::MockLayout;

        #[tokio::test(start_paused = true)]
        async fn test_default_centered() {
            let page = MockPage::decision_coach(Viewport::new(1920, 1080, "Large"));
            let shots = run(Scenario::LayoutDefault, &page).await.unwrap();
            assert_eq!(shots.len(), 1);
            assert_eq!(page.viewport().await.unwrap(), Viewport::default());
        }

        #[tokio::test(start_paused = true)]
        async fn test_sweep_restores_viewport() {
            let page = MockPage::decision_coach(Viewport::default());
            run(Scenario::LayoutViewportSweep, &page).await.unwrap();
            assert_eq!(page.navigations(), 6);
            assert_eq!(page.viewport().await.unwrap(), Viewport::default());
        }

        #[tokio::test(start_paused = true)]
        async fn test_sweep_failure_names_viewport() {
            let page = MockPage::new(Viewport::default()).with_element(
                MockElement::new("main").with_layout(MockLayout::Centered {
                    max_width: 1000.0,
                    height: 600.0,
                    offset_x: 40.0,
                }),
            );
            let err = run(Scenario::LayoutViewportSweep, &page).await.unwrap_err();
            assert!(err.to_string().contains("Desktop Large (1920x1080)"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_stability_detects_reflow() {
            let page = MockPage::decision_coach(Viewport::default()).with_reflow(4.0);
            let err = run(Scenario::LayoutDynamicStability, &page).await.unwrap_err();
            assert!(err.to_string().contains("shifted 4.0px"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_stability_checks_narrow_and_wide() {
            let page = MockPage::decision_coach(Viewport::default());
            run(Scenario::LayoutDynamicStability, &page).await.unwrap();
            assert_eq!(page.navigations(), 2);
            assert_eq!(page.submitted().len(), 2);
            assert_eq!(page.viewport().await.unwrap(), Viewport::default());
        }

        #[tokio::test(start_paused = true)]
        async fn test_small_reflow_fails_only_wide() {
            let page = MockPage::decision_coach(Viewport::default()).with_reflow(3.0);
            let err = run(Scenario::LayoutDynamicStability, &page).await.unwrap_err();
            let message = err.to_string();
            assert!(message.contains("Desktop Standard (1366x768)"), "{message}");
            assert!(!message.contains("Mobile"), "{message}");
        }

        #[tokio::test(start_paused = true)]
        async fn test_large_reflow_fails_narrow() {
            let page = MockPage::decision_coach(Viewport::default()).with_reflow(7.0);
            let err = run(Scenario::LayoutDynamicStability, &page).await.unwrap_err();
            assert!(err.to_string().contains("Mobile (375x667)"));
        }
    }

    mod context {
        use super::*;

        #[test]
        fn test_debug_names_scenario() {
            let (_dir, config, artifacts) = setup();
            let page = MockPage::decision_coach(Viewport::default());
            let ctx = ScenarioContext::new(&page, &config, &artifacts, "layout_default");
            let debug = format!("{ctx:?}");
            assert!(debug.starts_with("ScenarioContext"));
            assert!(debug.contains("layout_default"));
            assert!(debug.contains("base_url"));
        }
    }
}
