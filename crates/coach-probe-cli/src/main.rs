//! coach-probe: end-to-end checks of the Decision Coach web app
//!
//! ## Usage
//!
//! ```bash
//! coach-probe list                          # Show scenarios
//! coach-probe check --wait 60               # Wait for the frontend
//! coach-probe test                          # Run every scenario
//! coach-probe test --filter layout -j 2     # Layout scenarios, two at a time
//! coach-probe test --dry-run                # In-memory page, no browser
//! ```

use clap::Parser;
use coach_probe_cli::{
    handlers, init_logging, Cli, CliConfig, CliError, CliResult, ColorChoice, Commands, Verbosity,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    init_logging(&config)?;

    match cli.command {
        Commands::List(args) => handlers::execute_list(&args),
        Commands::Test(args) => {
            let report = runtime()?.block_on(handlers::execute_test(&config, &args))?;
            handlers::ensure_passed(&report)
        }
        Commands::Check(args) => {
            runtime()?.block_on(handlers::execute_check(&config, &args))?;
            Ok(())
        }
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let color: ColorChoice = cli.color.into();
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(color)
        .with_log_json(cli.log_json)
}

fn runtime() -> CliResult<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CliError::config(format!("Failed to create async runtime: {e}")))
}
