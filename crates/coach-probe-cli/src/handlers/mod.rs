//! Command handlers, kept out of main.rs for testability

pub mod check;
pub mod list;
pub mod suite;

pub use check::execute_check;
pub use list::{execute_list, format_scenario_list};
pub use suite::{build_suite_config, ensure_passed, execute_test, select_scenarios};

use crate::commands::TargetArgs;
use crate::error::CliResult;
use coach_probe::SuiteConfig;

/// Layer the suite config: defaults or YAML file, then environment, then flags
pub fn load_target_config<F>(target: &TargetArgs, lookup: F) -> CliResult<SuiteConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let base = match &target.config {
        Some(path) => SuiteConfig::load(path)?,
        None => SuiteConfig::default(),
    };
    let mut config = base.apply_env(lookup);

    if let Some(url) = &target.base_url {
        config.base_url.clone_from(url);
    }
    if target.headed {
        config.browser.headless = false;
    }
    if let Some(path) = &target.chromium_path {
        config.browser.chromium_path = Some(path.clone());
    }
    if target.no_sandbox {
        config.browser.sandbox = false;
    }
    Ok(config)
}

/// Lookup backed by the process environment
pub(crate) fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults_without_file() {
        let config = load_target_config(&TargetArgs::default(), no_env).unwrap();
        assert_eq!(config.base_url(), "http://localhost:3000");
        assert!(config.browser.headless);
    }

    #[test]
    fn test_file_then_env_then_flags() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "base_url: http://from-file:3000\nretries: 4").unwrap();

        let target = TargetArgs {
            config: Some(file.path().to_path_buf()),
            ..TargetArgs::default()
        };
        let config = load_target_config(&target, no_env).unwrap();
        assert_eq!(config.base_url(), "http://from-file:3000");
        assert_eq!(config.retries, 4);

        let env = |key: &str| (key == "COACH_BASE_URL").then(|| "http://from-env:3000".to_string());
        let config = load_target_config(&target, env).unwrap();
        assert_eq!(config.base_url(), "http://from-env:3000");

        let target = TargetArgs {
            base_url: Some("http://from-flag:3000".to_string()),
            headed: true,
            no_sandbox: true,
            ..target
        };
        let config = load_target_config(&target, env).unwrap();
        assert_eq!(config.base_url(), "http://from-flag:3000");
        assert!(!config.browser.headless);
        assert!(!config.browser.sandbox);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let target = TargetArgs {
            config: Some("/nonexistent/coach-probe.yaml".into()),
            ..TargetArgs::default()
        };
        assert!(load_target_config(&target, no_env).is_err());
    }
}
