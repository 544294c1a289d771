//! Check command handler

use coach_probe::{ReadinessChecker, ReadinessResult, SuiteConfig};
use std::time::Duration;

use super::{load_target_config, process_env};
use crate::commands::CheckArgs;
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;

/// Probe the frontend over HTTP, optionally polling, then optionally check its form
pub async fn execute_check(cli: &CliConfig, args: &CheckArgs) -> CliResult<ReadinessResult> {
    let config = load_target_config(&args.target, process_env)?;
    config.validate()?;
    let reporter = ProgressReporter::new(cli.color.should_color(), cli.verbosity.is_quiet());
    let checker = ReadinessChecker::new(config.base_url(), config.readiness)?;

    let result = match args.wait {
        Some(secs) => {
            reporter.info(&format!("waiting up to {secs}s for {}", checker.url()));
            checker.poll_ready(Duration::from_secs(secs)).await
        }
        None => checker.check_readiness().await,
    };
    if !result.ready {
        let message = result.error.clone().unwrap_or_else(|| "no response".to_string());
        reporter.failure(&format!("{} not ready: {message}", checker.url()));
        return Err(CliError::not_ready(checker.url(), message));
    }
    reporter.success(&format_ready(checker.url(), &result));

    if args.interface {
        let errors = check_interface(&config).await?;
        if !errors.is_empty() {
            for error in &errors {
                reporter.failure(error);
            }
            return Err(CliError::not_ready(checker.url(), errors.join("; ")));
        }
        reporter.success("query input and submit button are visible");
    }
    Ok(result)
}

/// `url ready in 12ms (attempt 1)`
#[must_use]
pub fn format_ready(url: &str, result: &ReadinessResult) -> String {
    let ms = result.response_time.unwrap_or_default().as_millis();
    format!("{url} ready in {ms}ms (attempt {})", result.attempts)
}

#[cfg(feature = "browser")]
async fn check_interface(config: &SuiteConfig) -> CliResult<Vec<String>> {
    use coach_probe::PageHandle;

    let browser = coach_probe::Browser::launch(config.browser.clone()).await?;
    let page = browser.new_page().await?;
    let outcome = match page.goto(config.base_url()).await {
        Ok(()) => coach_probe::readiness::validate_interface(&page).await,
        Err(e) => Err(e),
    };
    if let Err(e) = browser.close().await {
        tracing::warn!(error = %e, "browser did not close cleanly");
    }
    Ok(outcome?)
}

#[cfg(not(feature = "browser"))]
async fn check_interface(_config: &SuiteConfig) -> CliResult<Vec<String>> {
    Err(CliError::Unsupported(
        "--interface needs browser support; rebuild with --features browser".to_string(),
    ))
}
