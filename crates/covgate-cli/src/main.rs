//! covgate: enforce per-domain coverage thresholds
//!
//! ## Usage
//!
//! ```bash
//! covgate check                      # Check coverage against .covgate.yaml
//! covgate check --diff --base main   # Only files changed since main
//! covgate record                     # Append to the coverage history
//! covgate trend                      # Show trend and prediction
//! covgate watch                      # Re-check when profiles change
//! covgate init                       # Write a starter .covgate.yaml
//! ```
//!
//! Exit codes: 0 pass, 1 coverage below policy, 2 any other error.

use clap::Parser;
use covgate_cli::{
    handlers, Cli, CliConfig, CliResult, ColorChoice, Commands, Verbosity, EXIT_PASS,
};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = build_config(&cli);
    init_tracing(&config);

    match run(cli, &config) {
        Ok(()) => ExitCode::from(EXIT_PASS),
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(cli: Cli, config: &CliConfig) -> CliResult<()> {
    match cli.command {
        Commands::Check(args) => handlers::check::execute_check(config, &args),
        Commands::Record(args) => handlers::history::execute_record(config, &args),
        Commands::Trend(args) => handlers::history::execute_trend(config, &args),
        Commands::Watch(args) => handlers::watch::execute_watch(config, &args),
        Commands::Detect(args) => handlers::init::execute_detect(config, &args),
        Commands::Init(args) => handlers::init::execute_init(config, &args).map(|_| ()),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let color: ColorChoice = cli.color.into();
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(color)
        .with_log_json(cli.log_json)
        .with_dir(cli.dir.clone())
        .with_config_path(cli.config.clone())
}

/// Logs go to stderr; `RUST_LOG` overrides the `-v`/`-q` level
fn init_tracing(config: &CliConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.verbosity.log_filter()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if config.log_json {
        builder.json().init();
    } else {
        let ansi = match config.color {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => console::colors_enabled_stderr(),
        };
        builder.with_ansi(ansi).init();
    }
}
