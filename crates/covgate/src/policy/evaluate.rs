//! Threshold evaluation.
//!
//! [`evaluate`] is a pure function: it returns the result together with the
//! events raised while producing it.

use super::{Aggregation, FileRule, PatternSet, Policy, Status};
use crate::coverage::{round1, total_of, CoverageStat};
use crate::result::CovgateResult;
use serde::{Deserialize, Serialize};

/// Evaluation switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluateOptions {
    /// Drop domains without data instead of failing them
    pub diff_mode: bool,
}

/// Outcome for one domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainResult {
    /// Domain name
    pub name: String,
    /// Aggregated coverage
    pub stat: CoverageStat,
    /// `stat` as a percentage, one decimal
    pub percent: f64,
    /// Effective minimum
    pub required: f64,
    /// Warn threshold, if configured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warn: Option<f64>,
    /// Pass, warn or fail
    pub status: Status,
    /// Points missing to reach `required`, 0 unless failing
    pub shortfall: f64,
}

/// Outcome for one file matched by a file rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileResult {
    /// Module-relative path
    pub path: String,
    /// File coverage
    pub stat: CoverageStat,
    /// `stat` as a percentage, one decimal
    pub percent: f64,
    /// Highest minimum among the matching rules
    pub required: f64,
    /// Whether `percent` reaches `required`
    pub passed: bool,
    /// Points missing to reach `required`, 0 when passed
    pub shortfall: f64,
}

/// Everything a caller needs to report a check
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Evaluated domains in policy order
    pub domains: Vec<DomainResult>,
    /// Files matched by file rules
    pub files: Vec<FileResult>,
    /// No failing domain and no failing file
    pub passed: bool,
    /// Non-fatal problems found on the way
    pub warnings: Vec<String>,
}

impl EvaluationResult {
    /// A passing result with nothing evaluated
    #[must_use]
    pub fn vacuous(warning: impl Into<String>) -> Self {
        Self {
            domains: Vec::new(),
            files: Vec::new(),
            passed: true,
            warnings: vec![warning.into()],
        }
    }

    /// Sum of the evaluated domains' stats
    #[must_use]
    pub fn overall(&self) -> CoverageStat {
        total_of(self.domains.iter().map(|d| &d.stat))
    }

    /// Domains with `Fail` status
    pub fn failing(&self) -> impl Iterator<Item = &DomainResult> {
        self.domains.iter().filter(|d| d.status == Status::Fail)
    }
}

/// Facts raised by evaluation and trend comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    /// A check finished
    Evaluated {
        overall_percent: f64,
        passed: bool,
        domain_count: usize,
        failing_count: usize,
    },
    /// A domain fell below its minimum
    ThresholdViolated {
        domain: String,
        actual: f64,
        required: f64,
        shortfall: f64,
    },
    /// Coverage rose by more than the significance bar
    CoverageImproved {
        scope: String,
        previous: f64,
        current: f64,
        delta: f64,
    },
    /// Coverage fell by more than the significance bar
    CoverageRegressed {
        scope: String,
        previous: f64,
        current: f64,
        delta: f64,
    },
}

/// Evaluate aggregated coverage against a policy and file rules
///
/// Fails only when a file rule pattern does not compile.
pub fn evaluate(
    policy: &Policy,
    aggregation: &Aggregation,
    file_rules: &[FileRule],
    options: EvaluateOptions,
) -> CovgateResult<(EvaluationResult, Vec<DomainEvent>)> {
    let mut warnings = aggregation.warnings.clone();
    let mut domains = Vec::with_capacity(policy.domains().len());

    for spec in policy.domains() {
        let stat = aggregation
            .domains
            .get(&spec.name)
            .copied()
            .unwrap_or_default();

        if stat.is_empty() {
            if options.diff_mode {
                tracing::debug!(domain = %spec.name, "no changed files, dropped");
                continue;
            }
            warnings.push(format!("domain {} has no coverage data", spec.name));
        }

        let percent = stat.percent();
        let required = policy.required(spec);
        let status = Status::classify(percent, required, spec.warn);
        let shortfall = if status == Status::Fail {
            round1(required - percent)
        } else {
            0.0
        };

        domains.push(DomainResult {
            name: spec.name.clone(),
            stat,
            percent,
            required,
            warn: spec.warn,
            status,
            shortfall,
        });
    }

    let files = evaluate_files(aggregation, file_rules)?;

    let failing_count = domains.iter().filter(|d| d.status == Status::Fail).count();
    let passed = failing_count == 0 && files.iter().all(|f| f.passed);

    let result = EvaluationResult {
        domains,
        files,
        passed,
        warnings,
    };

    let mut events = vec![DomainEvent::Evaluated {
        overall_percent: result.overall().percent(),
        passed,
        domain_count: result.domains.len(),
        failing_count,
    }];
    events.extend(result.failing().map(|d| DomainEvent::ThresholdViolated {
        domain: d.name.clone(),
        actual: d.percent,
        required: d.required,
        shortfall: d.shortfall,
    }));

    tracing::info!(
        passed,
        domains = result.domains.len(),
        failing = failing_count,
        "evaluation complete"
    );

    Ok((result, events))
}

fn evaluate_files(
    aggregation: &Aggregation,
    file_rules: &[FileRule],
) -> CovgateResult<Vec<FileResult>> {
    if file_rules.is_empty() {
        return Ok(Vec::new());
    }

    let compiled = file_rules
        .iter()
        .map(|rule| Ok((PatternSet::new(&rule.match_patterns)?, rule.min)))
        .collect::<CovgateResult<Vec<_>>>()?;

    let mut results = Vec::new();
    for (path, stat) in &aggregation.files {
        let required = compiled
            .iter()
            .filter(|(patterns, _)| patterns.matches(path))
            .map(|(_, min)| *min)
            .fold(None, |acc: Option<f64>, min| Some(acc.map_or(min, |a| a.max(min))));

        let Some(required) = required else {
            continue;
        };
        let percent = stat.percent();
        let passed = percent >= required;
        results.push(FileResult {
            path: path.clone(),
            stat: *stat,
            percent,
            required,
            passed,
            shortfall: if passed { 0.0 } else { round1(required - percent) },
        });
    }
    Ok(results)
}
