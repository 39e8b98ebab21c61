//! Watch command handler

use super::check::report;
use super::Project;
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::OutputFormat;
use crate::WatchArgs;
use covgate::WatchConfig;

/// Load the project, apply overrides and run one check
///
/// The configuration is reloaded on every run so edits to it take effect.
#[cfg_attr(not(feature = "watch"), allow(dead_code))]
fn check_once(config: &CliConfig, args: &WatchArgs) -> CliResult<()> {
    let mut project = Project::load(config)?;
    project.apply(&args.policy)?;
    let outcome = project.checker()?.check()?;
    report(config, &outcome, OutputFormat::Text)
}

/// Filter for the file watcher
#[must_use]
pub fn watch_config(args: &WatchArgs) -> WatchConfig {
    args.extensions
        .iter()
        .fold(WatchConfig::default(), |config, ext| {
            config.with_extension(ext)
        })
}

/// Execute the watch command
#[cfg(feature = "watch")]
pub fn execute_watch(config: &CliConfig, args: &WatchArgs) -> CliResult<()> {
    use crate::output::Reporter;
    use covgate::{run_watch, CovgateError, FileChange, FileWatcher};
    use tokio::sync::oneshot;

    let root = Project::load(config)?.root;
    let reporter = Reporter::new(config.use_color(), config.verbosity.is_quiet());

    // A broken first run is reported but does not stop the watch.
    if let Err(e) = check_once(config, args) {
        reporter.failure(&e.to_string());
    }

    let mut watcher = FileWatcher::new(watch_config(args))?;
    watcher.watch_dir(&root)?;
    let events = watcher.events()?;
    reporter.info(&format!("watching {} (ctrl-c to stop)", root.display()));

    let rt = tokio::runtime::Runtime::new()?;
    let outcome = rt.block_on(async {
        let (cancel_tx, cancel_rx) = oneshot::channel();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = cancel_tx.send("interrupted".to_string());
            }
        });

        run_watch(events, cancel_rx, |change: &FileChange| {
            reporter.info(&format!("{} changed", change.path.display()));
            check_once(config, args).map_err(|e| CovgateError::watch(e.to_string()))
        })
        .await
    });

    match outcome {
        Ok(stats) => {
            tracing::info!(triggers = stats.trigger_count, "watch finished");
            Ok(())
        }
        Err(CovgateError::Cancelled { reason }) => {
            reporter.info(&format!("stopped: {reason}"));
            Ok(())
        }
        Err(e) => Err(CliError::from(e)),
    }
}

/// Execute the watch command
#[cfg(not(feature = "watch"))]
pub fn execute_watch(_config: &CliConfig, _args: &WatchArgs) -> CliResult<()> {
    Err(CliError::config(
        "watch support not enabled; rebuild with --features watch",
    ))
}
