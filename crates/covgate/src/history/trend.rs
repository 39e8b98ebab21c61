//! Trend between two recorded entries.

use super::HistoryEntry;
use crate::coverage::round1;
use crate::policy::DomainEvent;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Changes at or below this many points raise no event
pub const SIGNIFICANT_DELTA: f64 = 1.0;

/// Sign of a change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Stable,
}

impl Direction {
    /// Arrow used in terminal output
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Up => "↑",
            Self::Down => "↓",
            Self::Stable => "→",
        }
    }
}

/// Direction and size of a change
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    /// Sign of `delta`
    pub direction: Direction,
    /// Current minus previous, one decimal
    pub delta: f64,
}

impl Trend {
    /// No change
    #[must_use]
    pub const fn stable() -> Self {
        Self {
            direction: Direction::Stable,
            delta: 0.0,
        }
    }

    /// Whether the change clears the significance bar
    #[must_use]
    pub fn is_significant(&self) -> bool {
        self.delta.abs() > SIGNIFICANT_DELTA
    }
}

/// Trend from `previous` to `current`, rounded to one decimal
#[must_use]
pub fn calculate_trend(previous: f64, current: f64) -> Trend {
    let delta = round1(current - previous);
    let direction = if delta > 0.0 {
        Direction::Up
    } else if delta < 0.0 {
        Direction::Down
    } else {
        Direction::Stable
    };
    Trend { direction, delta }
}

/// Overall and per-domain trends plus significant-change events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    /// Change of the overall percentage
    pub overall: Trend,
    /// Change per domain of the current entry
    pub domains: BTreeMap<String, Trend>,
    /// Improvements and regressions beyond the significance bar
    pub events: Vec<DomainEvent>,
}

/// Compare the current entry with the previous one
///
/// Without a previous entry, and for domains the previous entry lacks,
/// every trend is stable.
#[must_use]
pub fn compare(previous: Option<&HistoryEntry>, current: &HistoryEntry) -> TrendReport {
    let Some(previous) = previous else {
        return TrendReport {
            overall: Trend::stable(),
            domains: current
                .domains
                .keys()
                .map(|name| (name.clone(), Trend::stable()))
                .collect(),
            events: Vec::new(),
        };
    };

    let mut events = Vec::new();
    let overall = calculate_trend(previous.overall, current.overall);
    push_event(&mut events, "overall", previous.overall, current.overall, overall);

    let mut domains = BTreeMap::new();
    for (name, snapshot) in &current.domains {
        let trend = match previous.domain_percent(name) {
            Some(before) => {
                let trend = calculate_trend(before, snapshot.percent);
                push_event(&mut events, name, before, snapshot.percent, trend);
                trend
            }
            None => Trend::stable(),
        };
        domains.insert(name.clone(), trend);
    }

    TrendReport {
        overall,
        domains,
        events,
    }
}

fn push_event(events: &mut Vec<DomainEvent>, scope: &str, previous: f64, current: f64, trend: Trend) {
    if !trend.is_significant() {
        return;
    }
    let scope = scope.to_string();
    events.push(match trend.direction {
        Direction::Up => DomainEvent::CoverageImproved {
            scope,
            previous,
            current,
            delta: trend.delta,
        },
        Direction::Down | Direction::Stable => DomainEvent::CoverageRegressed {
            scope,
            previous,
            current,
            delta: trend.delta,
        },
    });
}
