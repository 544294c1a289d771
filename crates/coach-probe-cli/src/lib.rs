//! coach-probe CLI library
//!
//! Command-line front end for the coach-probe end-to-end suite.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
pub mod handlers;
mod logging;
mod output;

pub use commands::{CheckArgs, Cli, ColorArg, Commands, FormatArg, ListArgs, TargetArgs, TestArgs};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use logging::{env_filter, init_logging};
pub use output::{format_entry, format_summary, OutputFormat, ProgressReporter};
