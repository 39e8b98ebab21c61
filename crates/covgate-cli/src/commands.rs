//! CLI command definitions using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// covgate: enforce per-domain coverage thresholds
#[derive(Parser, Debug)]
#[command(name = "covgate")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Project directory
    #[arg(short = 'C', long = "dir", default_value = ".", global = true)]
    pub dir: PathBuf,

    /// Configuration file (default: <dir>/.covgate.yaml, autodetected when absent)
    #[arg(short, long, global = true, env = "COVGATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check coverage against the policy
    Check(CheckArgs),

    /// Record current coverage into the history file
    Record(RecordArgs),

    /// Show the coverage trend and prediction
    Trend(TrendArgs),

    /// Re-run the check whenever profiles or configuration change
    Watch(WatchArgs),

    /// Show what autodetection finds
    Detect(DetectArgs),

    /// Write a starter .covgate.yaml from autodetection
    Init(InitArgs),
}

/// Overrides shared by commands that evaluate coverage
#[derive(Args, Debug, Clone, Default)]
pub struct PolicyArgs {
    /// Only evaluate files changed since the base revision
    #[arg(long)]
    pub diff: bool,

    /// Base revision for --diff
    #[arg(long, value_name = "REV")]
    pub base: Option<String>,

    /// Coverage profile (repeatable; replaces configured profiles)
    #[arg(short, long = "profile", value_name = "PATH")]
    pub profiles: Vec<PathBuf>,
}

/// Arguments for the check command
#[derive(Parser, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub policy: PolicyArgs,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: FormatArg,
}

/// Arguments for the record command
#[derive(Parser, Debug)]
pub struct RecordArgs {
    /// Coverage profile (repeatable; replaces configured profiles)
    #[arg(short, long = "profile", value_name = "PATH")]
    pub profiles: Vec<PathBuf>,

    /// History file (default from configuration)
    #[arg(long, value_name = "PATH")]
    pub history: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: FormatArg,
}

/// Arguments for the trend command
#[derive(Parser, Debug)]
pub struct TrendArgs {
    /// History file (default from configuration)
    #[arg(long, value_name = "PATH")]
    pub history: Option<PathBuf>,

    /// Entries used for statistics and prediction (0 = all)
    #[arg(short, long)]
    pub window: Option<usize>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: FormatArg,
}

/// Arguments for the watch command
#[derive(Parser, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub policy: PolicyArgs,

    /// Extra file extension that triggers a check (repeatable)
    #[arg(long = "ext", value_name = "EXT")]
    pub extensions: Vec<String>,
}

/// Arguments for the detect command
#[derive(Parser, Debug)]
pub struct DetectArgs {
    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: FormatArg,
}

/// Arguments for the init command
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Overwrite an existing configuration file
    #[arg(short, long)]
    pub force: bool,
}

/// Output format argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FormatArg {
    /// Human-readable text
    #[default]
    Text,
    /// JSON
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

/// Color argument
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
