//! Test command handler: run a suite and write its reports

use coach_probe::mock::{MockPage, MockPageFactory};
use coach_probe::{Scenario, ScenarioRunner, SuiteConfig, SuiteReport};

use super::{load_target_config, process_env};
use crate::commands::TestArgs;
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::{OutputFormat, ProgressReporter};

/// Suite config for a test run, with flags applied last
pub fn build_suite_config<F>(args: &TestArgs, lookup: F) -> CliResult<SuiteConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = load_target_config(&args.target, lookup)?;
    if let Some(jobs) = args.jobs {
        config.workers = jobs;
    }
    if let Some(retries) = args.retries {
        config.retries = retries;
    }
    if let Some(dir) = &args.output {
        config.output_dir.clone_from(dir);
    }
    if args.only.is_some() && config.forbid_only {
        return Err(CliError::invalid_argument(
            "--only is not allowed when focused runs are forbidden (CI)",
        ));
    }
    config.validate()?;
    Ok(config)
}

/// Scenarios named by `--only` or matched by `--filter`
pub fn select_scenarios(args: &TestArgs) -> CliResult<Vec<Scenario>> {
    if let Some(name) = &args.only {
        let scenario = name.parse::<Scenario>().map_err(|_| {
            CliError::invalid_argument(format!(
                "unknown scenario {name:?}; run `coach-probe list` to see them"
            ))
        })?;
        return Ok(vec![scenario]);
    }

    let scenarios = Scenario::select(args.filter.as_deref());
    if scenarios.is_empty() {
        return Err(CliError::invalid_argument(format!(
            "no scenario matches {:?}",
            args.filter.as_deref().unwrap_or_default()
        )));
    }
    Ok(scenarios)
}

/// Run the selected scenarios and write reports under the output directory
pub async fn execute_test(cli: &CliConfig, args: &TestArgs) -> CliResult<SuiteReport> {
    let config = build_suite_config(args, process_env)?;
    let scenarios = select_scenarios(args)?;
    let format = OutputFormat::from(args.format);
    let mut reporter = ProgressReporter::new(
        cli.color.should_color(),
        cli.verbosity.is_quiet() || format == OutputFormat::Json,
    );

    reporter.header(&format!("Decision Coach E2E against {}", config.base_url()));
    if config.ci {
        reporter.info("CI detected: serial run with re-runs, focused runs rejected");
    }
    reporter.start_spinner(&format!("running {} scenario(s)", scenarios.len()));
    let report = if args.dry_run {
        Ok(run_dry(config.clone(), &scenarios).await)
    } else {
        run_live(config.clone(), &scenarios, !args.skip_readiness).await
    };
    reporter.finish();
    let report = report?;

    for entry in &report.results {
        reporter.result(entry);
    }
    for path in report.write(&config.output_dir)? {
        tracing::info!(path = %path.display(), "report written");
    }
    reporter.summary(&report);
    if format == OutputFormat::Json {
        println!("{}", report.to_json()?);
    }
    Ok(report)
}

/// Fail when any scenario failed
pub fn ensure_passed(report: &SuiteReport) -> CliResult<()> {
    if report.all_passed() {
        Ok(())
    } else {
        Err(CliError::ScenariosFailed {
            failed: report.failed_count(),
            total: report.total_count(),
        })
    }
}

/// In-memory run against a well-behaved Decision Coach page
async fn run_dry(config: SuiteConfig, scenarios: &[Scenario]) -> SuiteReport {
    let viewport = config.browser.viewport();
    tracing::info!(scenarios = scenarios.len(), "dry run against in-memory page");
    let factory = MockPageFactory::new(move || MockPage::decision_coach(viewport.clone()));
    ScenarioRunner::new(factory, config).run(scenarios).await
}

#[cfg(feature = "browser")]
async fn run_live(
    config: SuiteConfig,
    scenarios: &[Scenario],
    readiness: bool,
) -> CliResult<SuiteReport> {
    let browser = coach_probe::Browser::launch(config.browser.clone()).await?;
    let mut runner = ScenarioRunner::new(browser, config);
    if readiness {
        runner = runner.with_readiness_check()?;
    }
    let report = runner.run(scenarios).await;
    if let Err(e) = runner.into_factory().close().await {
        tracing::warn!(error = %e, "browser did not close cleanly");
    }
    Ok(report)
}

#[cfg(not(feature = "browser"))]
async fn run_live(
    _config: SuiteConfig,
    _scenarios: &[Scenario],
    _readiness: bool,
) -> CliResult<SuiteReport> {
    Err(CliError::Unsupported(
        "browser support not compiled in; rebuild with --features browser or pass --dry-run"
            .to_string(),
    ))
}
