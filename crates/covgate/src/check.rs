//! One check run, wired from its collaborators.
//!
//! ```text
//! resolve ─► overlap warnings ─► parse_all ─► normalize ─► diff filter
//!        ─► annotations ─► aggregate ─► evaluate
//! ```

use crate::annotations::AnnotationScanner;
use crate::clock::Clock;
use crate::config::Config;
use crate::coverage::ParserRegistry;
use crate::diff::{filter_changed, DiffProvider, RevisionSource};
use crate::history::{
    compare, predict, predict_domain, History, HistoryEntry, HistoryStats, HistoryStore, Prediction,
    Recorded, TrendReport,
};
use crate::normalize::{PathNormalizer, JVM_SOURCE_ROOTS};
use crate::policy::{
    evaluate, overlap_warnings, Aggregation, AnnotationMap, DomainEvent, DomainMatcher,
    EvaluateOptions, EvaluationResult, FileRule, Policy,
};
use crate::resolver::DomainResolver;
use crate::result::{CovgateError, CovgateResult};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Warning used when a diff leaves nothing to evaluate
pub const NO_CHANGED_COVERAGE: &str = "no changed files with coverage data";

/// Result of [`Checker::check`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckOutcome {
    /// Domain and file results
    pub result: EvaluationResult,
    /// Events raised by the evaluation
    pub events: Vec<DomainEvent>,
}

/// Result of [`Checker::trend`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSummary {
    /// Newest point of the series
    pub latest: HistoryEntry,
    /// Whether `latest` is the current run rather than a stored entry
    pub current: bool,
    /// Change from the entry before `latest`
    pub report: TrendReport,
    /// Statistics over the window, `None` when it is empty
    pub stats: Option<HistoryStats>,
    /// Next overall percentage
    pub prediction: Prediction,
    /// Next percentage per domain of `latest`
    pub domain_predictions: BTreeMap<String, Prediction>,
}

enum Collected {
    Empty(String),
    Ready {
        policy: Policy,
        file_rules: Vec<FileRule>,
        aggregation: Aggregation,
    },
}

/// Runs checks for one configuration
pub struct Checker {
    config: Config,
    resolver: Box<dyn DomainResolver>,
    registry: ParserRegistry,
    diff: Option<Box<dyn DiffProvider>>,
    scanner: Option<Box<dyn AnnotationScanner>>,
}

impl std::fmt::Debug for Checker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Checker")
            .field("config", &self.config)
            .field("module_root", &self.resolver.module_root())
            .field("diff", &self.diff.is_some())
            .field("annotations", &self.scanner.is_some())
            .finish_non_exhaustive()
    }
}

impl Checker {
    /// Create a checker; diff and annotation collaborators are optional
    #[must_use]
    pub fn new(config: Config, resolver: Box<dyn DomainResolver>) -> Self {
        Self {
            config,
            resolver,
            registry: ParserRegistry::new(),
            diff: None,
            scanner: None,
        }
    }

    /// Use a diff provider (required when diff mode is enabled)
    #[must_use]
    pub fn with_diff(mut self, diff: Box<dyn DiffProvider>) -> Self {
        self.diff = Some(diff);
        self
    }

    /// Use an annotation scanner
    #[must_use]
    pub fn with_annotations(mut self, scanner: Box<dyn AnnotationScanner>) -> Self {
        self.scanner = Some(scanner);
        self
    }

    /// The configuration in use
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Profile paths, relative entries resolved under the module root
    #[must_use]
    pub fn profile_paths(&self) -> Vec<PathBuf> {
        let root = self.resolver.module_root();
        self.config
            .profiles
            .iter()
            .map(|p| if p.is_absolute() { p.clone() } else { root.join(p) })
            .collect()
    }

    /// Evaluate current coverage against the policy
    pub fn check(&self) -> CovgateResult<CheckOutcome> {
        let diff_mode = self.config.diff.enabled;
        match self.collect(diff_mode)? {
            Collected::Empty(warning) => {
                tracing::warn!("{warning}");
                Ok(CheckOutcome {
                    result: EvaluationResult::vacuous(warning),
                    events: Vec::new(),
                })
            }
            Collected::Ready {
                policy,
                file_rules,
                aggregation,
            } => {
                let (result, events) = evaluate(
                    &policy,
                    &aggregation,
                    &file_rules,
                    EvaluateOptions { diff_mode },
                )?;
                for warning in &result.warnings {
                    tracing::warn!("{warning}");
                }
                Ok(CheckOutcome { result, events })
            }
        }
    }

    /// Record current coverage into the history store
    ///
    /// Always uses the full profile set, never the diff.
    pub fn record(
        &self,
        store: &dyn HistoryStore,
        clock: &dyn Clock,
        revision: &dyn RevisionSource,
    ) -> CovgateResult<Recorded> {
        let recorded = self.snapshot(clock, revision)?;
        store.append(recorded.entry.clone())?;
        tracing::info!(overall = recorded.entry.overall, commit = %recorded.entry.commit, "coverage recorded");
        Ok(recorded)
    }

    /// Build the entry `record` would append, without storing it
    pub fn snapshot(
        &self,
        clock: &dyn Clock,
        revision: &dyn RevisionSource,
    ) -> CovgateResult<Recorded> {
        let Collected::Ready {
            policy,
            aggregation,
            ..
        } = self.collect(false)?
        else {
            return Err(CovgateError::history("nothing to record"));
        };

        let mut recorded = crate::history::record(&aggregation, &policy, clock, &revision.revision());
        let mut warnings = aggregation.warnings;
        warnings.append(&mut recorded.warnings);
        recorded.warnings = warnings;
        Ok(recorded)
    }

    /// Trend of the current run against the stored history
    ///
    /// When no configured profile exists on disk the trend falls back to the
    /// last two stored entries. `None` when nothing has been recorded yet.
    pub fn trend(
        &self,
        store: &dyn HistoryStore,
        clock: &dyn Clock,
        revision: &dyn RevisionSource,
    ) -> CovgateResult<Option<TrendSummary>> {
        let history = store.load()?;
        if history.is_empty() {
            return Ok(None);
        }

        let current = if self.profile_paths().iter().any(|p| p.exists()) {
            let recorded = self.snapshot(clock, revision)?;
            for warning in &recorded.warnings {
                tracing::warn!("{warning}");
            }
            Some(recorded.entry)
        } else {
            tracing::debug!("no coverage profile on disk, trending stored entries only");
            None
        };

        Ok(summarize(&history, current, self.config.history.window))
    }

    fn collect(&self, diff_mode: bool) -> CovgateResult<Collected> {
        let policy = self.config.policy()?;
        let file_rules = self.config.file_rules()?;

        let directories = self.resolver.resolve(policy.domains())?;
        let mut warnings = overlap_warnings(&directories);

        let profiles = self.profile_paths();
        if profiles.is_empty() {
            return Err(CovgateError::configuration("no coverage profiles configured"));
        }
        let raw = self.registry.parse_all(&profiles)?;

        let root = self.resolver.module_root();
        let normalizer = PathNormalizer::new(root, self.resolver.module_path())
            .with_source_roots(JVM_SOURCE_ROOTS);
        let mut files = normalizer.normalize_map(raw);
        tracing::debug!(files = files.len(), "coverage normalized");

        if diff_mode {
            let provider = self.diff.as_deref().ok_or_else(|| {
                CovgateError::configuration("diff mode is enabled but no diff provider is available")
            })?;
            let changed = provider.changed_files(&self.config.diff.base)?;
            files = filter_changed(files, &changed);
            if files.is_empty() {
                return Ok(Collected::Empty(NO_CHANGED_COVERAGE.to_string()));
            }
        }

        let annotations = match &self.scanner {
            Some(scanner) => {
                let keys: Vec<String> = files.keys().cloned().collect();
                scanner.scan(root, &keys)?
            }
            None => AnnotationMap::new(),
        };

        let matcher = DomainMatcher::new(&policy, &directories, root, &self.config.exclude)?;
        let mut aggregation = matcher.aggregate(&files, &annotations);
        warnings.append(&mut aggregation.warnings);
        aggregation.warnings = warnings;

        Ok(Collected::Ready {
            policy,
            file_rules,
            aggregation,
        })
    }
}

/// Summarize a history, optionally extended by the current run
///
/// `current` is treated as the newest point of the series: it is compared
/// with the latest stored entry and feeds the statistics and predictions.
/// `None` when the series is empty.
#[must_use]
pub fn summarize(
    history: &History,
    current: Option<HistoryEntry>,
    window: usize,
) -> Option<TrendSummary> {
    let is_current = current.is_some();
    let mut series = history.clone();
    if let Some(entry) = current {
        series.push(entry);
    }

    let latest = series.latest()?;
    let entries = series.entries();
    let previous = entries.len().checked_sub(2).map(|i| &entries[i]);

    Some(TrendSummary {
        latest: latest.clone(),
        current: is_current,
        report: compare(previous, latest),
        stats: HistoryStats::from_entries(series.window(window)),
        prediction: predict(entries, window),
        domain_predictions: latest
            .domains
            .keys()
            .map(|name| (name.clone(), predict_domain(entries, name, window)))
            .collect(),
    })
}
