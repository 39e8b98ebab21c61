//! Record and trend command handlers

use super::Project;
use crate::config::CliConfig;
use crate::error::CliResult;
use crate::output::{render_entry, render_trend, to_json, OutputFormat, Reporter};
use crate::{RecordArgs, TrendArgs};
use covgate::{GitDiffProvider, SystemClock};

/// Execute the record command
pub fn execute_record(config: &CliConfig, args: &RecordArgs) -> CliResult<()> {
    let mut project = Project::load(config)?;
    project.override_profiles(&args.profiles)?;

    let store = project.history_store(args.history.as_deref());
    let revision = GitDiffProvider::new(&project.root);
    let recorded = project.checker()?.record(&store, &SystemClock, &revision)?;

    match OutputFormat::from(args.format) {
        OutputFormat::Json => println!("{}", to_json(&recorded)?),
        OutputFormat::Text => {
            let reporter = Reporter::new(config.use_color(), config.verbosity.is_quiet());
            reporter.success(&format!("recorded {}", render_entry(&recorded.entry)));
            for warning in &recorded.warnings {
                reporter.info(warning);
            }
            reporter.info(&format!("history: {}", store.path().display()));
        }
    }
    Ok(())
}

/// Execute the trend command
pub fn execute_trend(config: &CliConfig, args: &TrendArgs) -> CliResult<()> {
    let mut project = Project::load(config)?;
    if let Some(window) = args.window {
        project.config.history.window = window;
    }
    let store = project.history_store(args.history.as_deref());
    let revision = GitDiffProvider::new(&project.root);
    let summary = project.checker()?.trend(&store, &SystemClock, &revision)?;

    match (OutputFormat::from(args.format), summary) {
        (OutputFormat::Json, summary) => println!("{}", to_json(&summary)?),
        (OutputFormat::Text, None) => {
            Reporter::new(config.use_color(), config.verbosity.is_quiet())
                .info("no coverage history recorded yet; run `covgate record`");
        }
        (OutputFormat::Text, Some(summary)) => {
            let reporter = Reporter::new(config.use_color(), config.verbosity.is_quiet());
            reporter.block(&render_trend(&summary, reporter.use_color));
        }
    }
    Ok(())
}
