//! List command handler

use coach_probe::Scenario;

use crate::commands::ListArgs;
use crate::error::CliResult;

/// Print matching scenarios to stdout, one per line
pub fn execute_list(args: &ListArgs) -> CliResult<()> {
    let scenarios = Scenario::select(args.filter.as_deref());
    print!("{}", format_scenario_list(&scenarios));
    Ok(())
}

/// Aligned `name  description` lines
#[must_use]
pub fn format_scenario_list(scenarios: &[Scenario]) -> String {
    let width = scenarios.iter().map(|s| s.name().len()).max().unwrap_or(0);
    scenarios
        .iter()
        .map(|s| format!("{:width$}  {}\n", s.name(), s.description()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_aligns_descriptions() {
        let text = format_scenario_list(&[Scenario::ErrorStates, Scenario::LayoutViewportSweep]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("error_states           "));
        let column = "layout_viewport_sweep  ".len();
        assert_eq!(lines[0].find("empty"), Some(column));
    }

    #[test]
    fn test_format_empty() {
        assert!(format_scenario_list(&[]).is_empty());
    }
}
