//! covgate: Domain-Scoped Coverage Policy Engine
//!
//! Reads coverage reports in four formats, maps every file onto the
//! *domains* (directory groupings) that own it, and checks each domain
//! against its threshold. Results can be recorded to an append-only history
//! for trends and predictions.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                         COVGATE Pipeline                             │
//! ├──────────────────────────────────────────────────────────────────────┤
//! │  profiles ──► detect ──► parsers ──► PathNormalizer ──► CoverageMap  │
//! │                                                             │        │
//! │  Config ──► Policy ──► DomainResolver ──► DomainMatcher ◄───┘        │
//! │                                               │                      │
//! │                                          Aggregation                 │
//! │                                           │        │                 │
//! │                                      evaluate    record ──► History  │
//! │                                           │                  │       │
//! │                                  EvaluationResult     trend/predict  │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use covgate::{Checker, Config, FsDomainResolver, SourceAnnotationScanner};
//!
//! # fn main() -> covgate::CovgateResult<()> {
//! let config = Config::from_yaml_str(
//!     "policy:\n  domains:\n    - name: core\n      match: [\"./core/...\"]\n",
//! )?;
//! let checker = Checker::new(config, Box::new(FsDomainResolver::new(".")?))
//!     .with_annotations(Box::new(SourceAnnotationScanner::new()));
//! let outcome = checker.check()?;
//! println!("passed: {}", outcome.result.passed);
//! # Ok(())
//! # }
//! ```

mod result;

/// Coverage model, format detection and report parsers
pub mod coverage;

/// Mapping raw report keys onto module-relative paths
pub mod normalize;

/// Domains, thresholds, matching and evaluation
pub mod policy;

/// Recorded history, trends and predictions
pub mod history;

/// Clock capability for timestamps
pub mod clock;

/// Configuration file schema
pub mod config;

/// Language detection and default configuration
pub mod autodetect;

/// Domain pattern to directory resolution
pub mod resolver;

/// Changed files and revision metadata from git
pub mod diff;

/// `covgate:` source annotations
pub mod annotations;

/// Check orchestration
pub mod check;

/// Watch mode
#[allow(clippy::missing_errors_doc)]
pub mod watch;

pub use annotations::{AnnotationScanner, SourceAnnotationScanner};
pub use autodetect::{Autodetector, Detection, FsAutodetector, Language};
pub use check::{summarize, CheckOutcome, Checker, TrendSummary};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{Config, ConfigLoader, YamlConfigLoader, DEFAULT_CONFIG_FILE};
pub use coverage::{
    detect_format, CoverageMap, CoverageStat, MergePolicy, ParserRegistry, ProfileFormat,
    ProfileParser,
};
pub use diff::{DiffProvider, GitDiffProvider, RevisionSource};
pub use history::{
    Direction, History, HistoryEntry, HistoryStats, HistoryStore, JsonHistoryStore, Prediction,
    Revision, Trend, TrendReport,
};
pub use normalize::PathNormalizer;
pub use policy::{
    evaluate, Aggregation, Annotation, DomainEvent, DomainMatcher, DomainResult, DomainSpec,
    EvaluateOptions, EvaluationResult, FileResult, FileRule, Policy, Status,
};
pub use resolver::{DomainResolver, FsDomainResolver};
pub use result::{CovgateError, CovgateResult};
#[cfg(feature = "watch")]
pub use watch::FileWatcher;
pub use watch::{run_watch, FileChange, FileChangeKind, WatchConfig, WatchStats};
