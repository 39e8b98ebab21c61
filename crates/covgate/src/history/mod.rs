//! Coverage History
//!
//! Append-only record of past checks, plus the trend, statistics and
//! prediction computed over it.
//!
//! ```text
//! Aggregation ──► record(clock, revision) ──► HistoryEntry ──► HistoryStore::append
//!                                                  │
//!                 History ──► compare / HistoryStats / predict
//! ```

mod stats;
mod store;
mod trend;

pub use stats::{predict, predict_domain, HistoryStats, Prediction, SINGLE_POINT_CONFIDENCE, STABLE_BAND};
pub use store::{HistoryStore, JsonHistoryStore, MemoryHistoryStore};
pub use trend::{calculate_trend, compare, Direction, Trend, TrendReport, SIGNIFICANT_DELTA};

use crate::clock::Clock;
use crate::coverage::{round1, total_of};
use crate::policy::{Aggregation, Policy, Status};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One domain's state at record time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainSnapshot {
    /// Coverage percentage, one decimal
    pub percent: f64,
    /// Effective minimum when recorded
    pub min: f64,
    /// Status against `min`
    pub status: Status,
}

/// One recorded check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// When the entry was recorded
    pub timestamp: DateTime<Utc>,
    /// Commit hash, empty outside a repository
    #[serde(default)]
    pub commit: String,
    /// Branch name, empty outside a repository
    #[serde(default)]
    pub branch: String,
    /// Overall percentage across every domain
    pub overall: f64,
    /// Per-domain state
    #[serde(default)]
    pub domains: BTreeMap<String, DomainSnapshot>,
}

impl HistoryEntry {
    /// Percentage of one domain, if it was recorded
    #[must_use]
    pub fn domain_percent(&self, name: &str) -> Option<f64> {
        self.domains.get(name).map(|d| d.percent)
    }
}

/// Ordered, append-only list of entries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    #[serde(default)]
    entries: Vec<HistoryEntry>,
}

impl History {
    /// Create an empty history
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry
    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    /// Most recent entry
    #[must_use]
    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    /// All entries, oldest first
    #[must_use]
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// The last `size` entries (all of them when `size` is 0)
    #[must_use]
    pub fn window(&self, size: usize) -> &[HistoryEntry] {
        if size == 0 || size >= self.entries.len() {
            &self.entries
        } else {
            &self.entries[self.entries.len() - size..]
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<HistoryEntry> for History {
    fn from_iter<I: IntoIterator<Item = HistoryEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Where a recorded check came from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Revision {
    /// Commit hash
    pub commit: String,
    /// Branch name
    pub branch: String,
}

impl Revision {
    #[must_use]
    pub fn new(commit: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            commit: commit.into(),
            branch: branch.into(),
        }
    }
}

/// A new entry and the warnings raised while building it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recorded {
    /// The entry built from the current coverage
    pub entry: HistoryEntry,
    /// Aggregation and recording warnings
    pub warnings: Vec<String>,
}

/// Build a history entry from an aggregation
///
/// A configured domain without coverage data is recorded at 0% with a
/// warning; it never fails the recording.
#[must_use]
pub fn record(
    aggregation: &Aggregation,
    policy: &Policy,
    clock: &dyn Clock,
    revision: &Revision,
) -> Recorded {
    let mut warnings = Vec::new();
    let mut domains = BTreeMap::new();

    for spec in policy.domains() {
        let stat = aggregation
            .domains
            .get(&spec.name)
            .copied()
            .unwrap_or_default();
        if stat.is_empty() {
            warnings.push(format!("domain {} has no coverage data", spec.name));
        }
        let percent = stat.percent();
        let min = policy.required(spec);
        domains.insert(
            spec.name.clone(),
            DomainSnapshot {
                percent,
                min,
                status: Status::classify(percent, min, spec.warn),
            },
        );
    }

    let overall = total_of(aggregation.domains.values());
    let overall = if overall.total == 0 {
        0.0
    } else {
        round1(overall.covered as f64 / overall.total as f64 * 100.0)
    };

    Recorded {
        entry: HistoryEntry {
            timestamp: clock.now(),
            commit: revision.commit.clone(),
            branch: revision.branch.clone(),
            overall,
            domains,
        },
        warnings,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::coverage::CoverageStat;
    use crate::policy::DomainSpec;

    pub(super) fn entry(overall: f64) -> HistoryEntry {
        HistoryEntry {
            timestamp: DateTime::<Utc>::UNIX_EPOCH,
            commit: String::new(),
            branch: String::new(),
            overall,
            domains: BTreeMap::new(),
        }
    }

    fn policy() -> Policy {
        Policy::new(
            80.0,
            vec![
                DomainSpec::new("core", &["core"]).with_min(90.0),
                DomainSpec::new("api", &["api"]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_record_overall_and_snapshots() {
        let mut agg = Aggregation::default();
        agg.domains.insert("core".into(), CoverageStat::new(95, 100));
        agg.domains.insert("api".into(), CoverageStat::new(50, 100));
        let clock = FixedClock::from_millis(1_700_000_000_000);

        let recorded = record(&agg, &policy(), &clock, &Revision::new("abc123", "main"));
        let entry = recorded.entry;

        assert_eq!(entry.overall, 72.5);
        assert_eq!(entry.commit, "abc123");
        assert_eq!(entry.branch, "main");
        assert_eq!(entry.timestamp, clock.now());
        assert_eq!(entry.domains["core"].status, Status::Pass);
        assert_eq!(entry.domains["core"].min, 90.0);
        assert_eq!(entry.domains["api"].status, Status::Fail);
        assert!(recorded.warnings.is_empty());
    }

    #[test]
    fn test_missing_domain_is_a_warning() {
        let mut agg = Aggregation::default();
        agg.domains.insert("core".into(), CoverageStat::new(9, 10));
        let clock = FixedClock::from_millis(0);

        let recorded = record(&agg, &policy(), &clock, &Revision::default());
        assert_eq!(recorded.warnings, vec!["domain api has no coverage data"]);
        assert_eq!(recorded.entry.domains["api"].percent, 0.0);
        assert_eq!(recorded.entry.overall, 90.0);
    }

    #[test]
    fn test_history_window() {
        let history: History = [70.0, 75.0, 80.0].into_iter().map(entry).collect();
        assert_eq!(history.window(2).len(), 2);
        assert_eq!(history.window(2)[0].overall, 75.0);
        assert_eq!(history.window(0).len(), 3);
        assert_eq!(history.window(10).len(), 3);
        assert_eq!(history.latest().unwrap().overall, 80.0);
    }

    #[test]
    fn test_history_json_shape() {
        let mut history = History::new();
        history.push(entry(80.0));
        let json = serde_json::to_value(&history).unwrap();
        assert!(json["entries"].is_array());
        assert_eq!(json["entries"][0]["overall"], 80.0);
    }
}
