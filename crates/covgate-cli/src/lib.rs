//! covgate CLI Library
//!
//! Argument parsing, output rendering and the command handlers behind the
//! `covgate` binary.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::format_push_string)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
pub mod handlers;
mod output;

pub use commands::{
    CheckArgs, Cli, ColorArg, Commands, DetectArgs, FormatArg, InitArgs, PolicyArgs, RecordArgs,
    TrendArgs, WatchArgs,
};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult, EXIT_ERROR, EXIT_PASS, EXIT_POLICY_FAILURE};
pub use output::{render_check, render_entry, render_trend, to_json, OutputFormat, Reporter};
