//! Coverage Profile Ingestion
//!
//! Turns raw coverage reports into one canonical per-file model.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  profile bytes → detect → parser → registry (merge) → CoverageMap │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Four report shapes are understood: the native `mode:` text profile,
//! LCOV, Cobertura XML and JaCoCo XML. Every parser yields statement (or
//! line) counts per file; nothing else from the report survives.

mod detect;
pub mod parsers;
mod registry;

pub use detect::{detect_content, detect_format, detect_format_or_default, SNIFF_LIMIT};
pub use parsers::{CoberturaParser, JacocoParser, LcovParser, NativeParser, ProfileParser};
pub use registry::ParserRegistry;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Per-file coverage, keyed by file path
pub type CoverageMap = BTreeMap<String, CoverageStat>;

/// Round to one decimal place
#[must_use]
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Covered and total statement counts for one file (or one domain)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoverageStat {
    /// Statements (or lines) executed at least once
    pub covered: u64,
    /// Instrumented statements (or lines)
    pub total: u64,
}

impl CoverageStat {
    /// Create a stat, clamping `covered` to `total`
    #[must_use]
    pub fn new(covered: u64, total: u64) -> Self {
        Self {
            covered: covered.min(total),
            total,
        }
    }

    /// Coverage percentage rounded to one decimal, 0 when nothing is instrumented
    #[must_use]
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        round1(self.covered as f64 / self.total as f64 * 100.0)
    }

    /// Whether anything was instrumented
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Add another stat to this one
    pub fn add(&mut self, other: Self) {
        self.covered += other.covered;
        self.total += other.total;
    }

    /// Combine with another stat using a merge policy
    #[must_use]
    pub fn merged(self, other: Self, policy: MergePolicy) -> Self {
        match policy {
            MergePolicy::Sum => Self::new(self.covered + other.covered, self.total + other.total),
            MergePolicy::Max => Self::new(
                self.covered.max(other.covered),
                self.total.max(other.total),
            ),
        }
    }
}

impl fmt::Display for CoverageStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({:.1}%)", self.covered, self.total, self.percent())
    }
}

/// How per-file entries from several profiles of one format are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MergePolicy {
    /// Disjoint suites: counts add up
    Sum,
    /// Repeated runs over the same lines: keep the larger count
    Max,
}

/// Merge `incoming` into `target` file by file
pub fn merge_into(target: &mut CoverageMap, incoming: CoverageMap, policy: MergePolicy) {
    for (file, stat) in incoming {
        let entry = target.entry(file).or_default();
        *entry = entry.merged(stat, policy);
    }
}

/// Sum of all stats in a map
#[must_use]
pub fn total_of<'a>(stats: impl IntoIterator<Item = &'a CoverageStat>) -> CoverageStat {
    stats.into_iter().fold(CoverageStat::default(), |mut acc, s| {
        acc.add(*s);
        acc
    })
}

/// Supported coverage profile formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileFormat {
    /// Native `mode:` text profile (`coverage.out`)
    Native,
    /// LCOV tracefile (`lcov.info`)
    Lcov,
    /// Cobertura XML
    Cobertura,
    /// JaCoCo XML
    Jacoco,
}

impl ProfileFormat {
    /// All formats in detection order
    pub const ALL: [Self; 4] = [Self::Native, Self::Cobertura, Self::Lcov, Self::Jacoco];

    /// Short lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Lcov => "lcov",
            Self::Cobertura => "cobertura",
            Self::Jacoco => "jacoco",
        }
    }
}

impl fmt::Display for ProfileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProfileFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "native" | "go" | "gocover" => Ok(Self::Native),
            "lcov" => Ok(Self::Lcov),
            "cobertura" => Ok(Self::Cobertura),
            "jacoco" => Ok(Self::Jacoco),
            other => Err(format!("unknown coverage format: {other}")),
        }
    }
}

#[cfg(test)]
mod tests;
