//! Coverage Policy
//!
//! Domains, thresholds and the rules that tie files to them.
//!
//! ```text
//! CoverageMap ──► DomainMatcher::aggregate ──► Aggregation ──► evaluate ──► EvaluationResult
//!                   (excludes, annotations,                     (thresholds,   + DomainEvents
//!                    directory ownership)                        file rules)
//! ```

mod evaluate;
mod matcher;
mod patterns;

pub use evaluate::{
    evaluate, DomainEvent, DomainResult, EvaluateOptions, EvaluationResult, FileResult,
};
pub use matcher::{overlap_warnings, Aggregation, DomainDirectories, DomainMatcher};
pub use patterns::PatternSet;

use crate::result::{CovgateError, CovgateResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Per-file overrides keyed by module-relative path
pub type AnnotationMap = BTreeMap<String, Annotation>;

/// A named, directory-scoped group of source files with its own threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainSpec {
    /// Unique domain name
    pub name: String,
    /// Directory patterns owned by the domain (`./internal/core/...`)
    #[serde(rename = "match")]
    pub match_patterns: Vec<String>,
    /// Minimum coverage; falls back to the policy default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Warn below this coverage even when above the minimum
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warn: Option<f64>,
    /// Files excluded from this domain only
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

impl DomainSpec {
    /// Create a domain owning the given directory patterns
    #[must_use]
    pub fn new(name: impl Into<String>, patterns: &[&str]) -> Self {
        Self {
            name: name.into(),
            match_patterns: patterns.iter().map(|p| (*p).to_string()).collect(),
            min: None,
            warn: None,
            exclude: Vec::new(),
        }
    }

    /// Set the minimum threshold
    #[must_use]
    pub fn with_min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    /// Set the warn threshold
    #[must_use]
    pub fn with_warn(mut self, warn: f64) -> Self {
        self.warn = Some(warn);
        self
    }

    /// Add a per-domain exclude pattern
    #[must_use]
    pub fn with_exclude(mut self, pattern: &str) -> Self {
        self.exclude.push(pattern.to_string());
        self
    }
}

/// Default threshold plus the configured domains; immutable once built
#[derive(Debug, Clone, PartialEq)]
pub struct Policy {
    default_min: f64,
    domains: Vec<DomainSpec>,
}

impl Policy {
    /// Build and validate a policy
    ///
    /// Fails on an empty domain list, a threshold outside `[0, 100]` or a
    /// duplicate domain name.
    pub fn new(default_min: f64, domains: Vec<DomainSpec>) -> CovgateResult<Self> {
        if domains.is_empty() {
            return Err(CovgateError::configuration("no domains configured"));
        }
        check_threshold("default min", default_min)?;

        let mut seen = BTreeSet::new();
        for domain in &domains {
            if domain.name.trim().is_empty() {
                return Err(CovgateError::configuration("domain name must not be empty"));
            }
            if !seen.insert(domain.name.as_str()) {
                return Err(CovgateError::configuration(format!(
                    "duplicate domain name: {}",
                    domain.name
                )));
            }
            if let Some(min) = domain.min {
                check_threshold(&format!("domain {} min", domain.name), min)?;
            }
            if let Some(warn) = domain.warn {
                check_threshold(&format!("domain {} warn", domain.name), warn)?;
            }
        }

        Ok(Self {
            default_min,
            domains,
        })
    }

    /// Threshold used by domains without their own minimum
    #[must_use]
    pub const fn default_min(&self) -> f64 {
        self.default_min
    }

    /// Configured domains in declaration order
    #[must_use]
    pub fn domains(&self) -> &[DomainSpec] {
        &self.domains
    }

    /// Look up a domain by name
    #[must_use]
    pub fn domain(&self, name: &str) -> Option<&DomainSpec> {
        self.domains.iter().find(|d| d.name == name)
    }

    /// Effective minimum for a domain
    #[must_use]
    pub fn required(&self, domain: &DomainSpec) -> f64 {
        domain.min.unwrap_or(self.default_min)
    }
}

/// A threshold applied to individual files matching any of its patterns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRule {
    /// Glob patterns over module-relative paths
    #[serde(rename = "match")]
    pub match_patterns: Vec<String>,
    /// Minimum coverage for each matching file
    pub min: f64,
}

impl FileRule {
    /// Create a file rule
    #[must_use]
    pub fn new(patterns: &[&str], min: f64) -> Self {
        Self {
            match_patterns: patterns.iter().map(|p| (*p).to_string()).collect(),
            min,
        }
    }

    /// Validate the rule's threshold
    pub fn validate(&self) -> CovgateResult<()> {
        check_threshold("file rule min", self.min)
    }
}

/// Per-file override produced by an annotation scanner
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// Drop the file from every domain
    pub ignore: bool,
    /// Assign the file to this domain instead of matching directories
    pub domain_override: Option<String>,
}

impl Annotation {
    /// An ignore annotation
    #[must_use]
    pub const fn ignored() -> Self {
        Self {
            ignore: true,
            domain_override: None,
        }
    }

    /// A domain override annotation
    #[must_use]
    pub fn domain(name: impl Into<String>) -> Self {
        Self {
            ignore: false,
            domain_override: Some(name.into()),
        }
    }
}

/// Outcome of comparing coverage with its thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// At or above every threshold
    Pass,
    /// Above the minimum, below the warn threshold
    Warn,
    /// Below the minimum
    Fail,
}

impl Status {
    /// Classify a percentage; equality with the minimum passes
    #[must_use]
    pub fn classify(percent: f64, required: f64, warn: Option<f64>) -> Self {
        if percent < required {
            Self::Fail
        } else if warn.is_some_and(|w| percent < w) {
            Self::Warn
        } else {
            Self::Pass
        }
    }

    /// Uppercase label used in reports
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Warn => "WARN",
            Self::Fail => "FAIL",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn check_threshold(what: &str, value: f64) -> CovgateResult<()> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(CovgateError::configuration(format!(
            "{what} must be within [0, 100], got {value}"
        )))
    }
}
