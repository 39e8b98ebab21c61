//! Check command handler

use super::Project;
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::{render_check, to_json, OutputFormat, Reporter};
use crate::CheckArgs;
use covgate::CheckOutcome;

/// Execute the check command
pub fn execute_check(config: &CliConfig, args: &CheckArgs) -> CliResult<()> {
    let mut project = Project::load(config)?;
    project.apply(&args.policy)?;
    let outcome = project.checker()?.check()?;
    report(config, &outcome, args.format.into())?;
    verdict(&outcome)
}

/// Print an outcome in the requested format
pub fn report(config: &CliConfig, outcome: &CheckOutcome, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => println!("{}", to_json(outcome)?),
        OutputFormat::Text => {
            let reporter = Reporter::new(config.use_color(), config.verbosity.is_quiet());
            reporter.block(&render_check(&outcome.result, reporter.use_color));
            if outcome.result.passed {
                reporter.success("coverage policy satisfied");
            } else {
                let failing = outcome.result.failing().count();
                reporter.failure(&format!("{failing} domain(s) below threshold"));
            }
        }
    }
    Ok(())
}

/// Map a finished check onto success or a policy violation
pub fn verdict(outcome: &CheckOutcome) -> CliResult<()> {
    if outcome.result.passed {
        return Ok(());
    }
    let failing = outcome.result.failing().count();
    let failing_files = outcome.result.files.iter().filter(|f| !f.passed).count();
    Err(CliError::policy_violation(failing, failing_files))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use covgate::EvaluationResult;

    #[test]
    fn test_vacuous_outcome_passes() {
        let outcome = CheckOutcome {
            result: EvaluationResult::vacuous("no changed files with coverage data"),
            events: Vec::new(),
        };
        assert!(verdict(&outcome).is_ok());
    }

    #[test]
    fn test_failed_outcome_is_policy_violation() {
        let mut result = EvaluationResult::vacuous("x");
        result.passed = false;
        let outcome = CheckOutcome {
            result,
            events: Vec::new(),
        };
        let err = verdict(&outcome).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_POLICY_FAILURE);
    }
}
