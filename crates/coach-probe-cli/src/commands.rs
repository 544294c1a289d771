//! CLI command definitions using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// coach-probe: end-to-end checks of the Decision Coach web app
#[derive(Parser, Debug)]
#[command(name = "coach-probe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (only failures are printed)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run scenarios against the frontend
    Test(TestArgs),

    /// Check that the frontend is up and its query form is usable
    Check(CheckArgs),

    /// List available scenarios
    List(ListArgs),
}

/// Settings shared by commands that talk to the frontend
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Frontend URL (overrides config and COACH_BASE_URL)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Path to the chromium binary
    #[arg(long)]
    pub chromium_path: Option<String>,

    /// Disable the chromium sandbox (containers)
    #[arg(long)]
    pub no_sandbox: bool,
}

/// Arguments for the test command
#[derive(Args, Debug, Clone, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct TestArgs {
    /// Frontend and browser settings
    #[command(flatten)]
    pub target: TargetArgs,

    /// Run scenarios whose name contains this pattern
    #[arg(short, long, conflicts_with = "only")]
    pub filter: Option<String>,

    /// Run exactly one scenario (rejected under CI)
    #[arg(long)]
    pub only: Option<String>,

    /// Scenarios run at once (0 = all at once)
    #[arg(short = 'j', long)]
    pub jobs: Option<usize>,

    /// Re-runs of a failed scenario
    #[arg(long)]
    pub retries: Option<u32>,

    /// Output directory for screenshots, page dumps, and reports
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Skip the HTTP readiness probe before each scenario
    #[arg(long)]
    pub skip_readiness: bool,

    /// Run against an in-memory page instead of a browser
    #[arg(long)]
    pub dry_run: bool,

    /// Result format
    #[arg(long, default_value = "text")]
    pub format: FormatArg,
}

/// Arguments for the check command
#[derive(Args, Debug, Clone, Default)]
pub struct CheckArgs {
    /// Frontend and browser settings
    #[command(flatten)]
    pub target: TargetArgs,

    /// Keep polling up to this many seconds
    #[arg(long)]
    pub wait: Option<u64>,

    /// Also open the page and look for the query input and submit button
    #[arg(long)]
    pub interface: bool,
}

/// Arguments for the list command
#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Only scenarios whose name contains this pattern
    #[arg(short, long)]
    pub filter: Option<String>,
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

/// Result format argument
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum FormatArg {
    /// Human-readable lines
    #[default]
    Text,
    /// Suite report JSON on stdout
    Json,
}

impl From<FormatArg> for crate::output::OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => Self::Text,
            FormatArg::Json => Self::Json,
        }
    }
}
