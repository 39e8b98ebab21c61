//! Window statistics and linear prediction.

use super::HistoryEntry;
use crate::coverage::round1;
use serde::{Deserialize, Serialize};

/// Consecutive changes within this many points count as stable
pub const STABLE_BAND: f64 = 0.5;

/// Confidence reported when only one data point exists
pub const SINGLE_POINT_CONFIDENCE: f64 = 10.0;

/// Summary of a window of entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryStats {
    /// Entries in the window
    pub count: usize,
    /// Highest overall percentage
    pub highest: f64,
    /// Lowest overall percentage
    pub lowest: f64,
    /// Mean overall percentage, one decimal
    pub average: f64,
    /// Consecutive pairs that rose beyond the stable band
    pub up: usize,
    /// Consecutive pairs that fell beyond the stable band
    pub down: usize,
    /// Consecutive pairs within the stable band
    pub stable: usize,
    /// Share of consecutive pairs that moved outside the stable band
    pub volatility: f64,
    /// 100 minus the spread between highest and lowest
    pub consistency_score: f64,
}

impl HistoryStats {
    /// Statistics over the overall percentages; `None` for an empty window
    #[must_use]
    pub fn from_entries(entries: &[HistoryEntry]) -> Option<Self> {
        let values: Vec<f64> = entries.iter().map(|e| e.overall).collect();
        Self::from_values(&values)
    }

    /// Statistics over a plain series
    #[must_use]
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let highest = values.iter().copied().fold(f64::MIN, f64::max);
        let lowest = values.iter().copied().fold(f64::MAX, f64::min);
        let average = round1(values.iter().sum::<f64>() / values.len() as f64);

        let (mut up, mut down, mut stable) = (0, 0, 0);
        for pair in values.windows(2) {
            let change = pair[1] - pair[0];
            if change > STABLE_BAND {
                up += 1;
            } else if change < -STABLE_BAND {
                down += 1;
            } else {
                stable += 1;
            }
        }

        let pairs = values.len() - 1;
        let volatility = if pairs == 0 {
            0.0
        } else {
            (up + down) as f64 / pairs as f64
        };

        Some(Self {
            count: values.len(),
            highest,
            lowest,
            average,
            up,
            down,
            stable,
            volatility,
            consistency_score: round1(100.0 - (highest - lowest)),
        })
    }
}

/// Predicted next value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted percentage, clamped to 0..=100
    pub value: f64,
    /// 0 to 100, lower for noisier series
    pub confidence: f64,
}

/// Predict the next overall percentage from the last `window` entries
#[must_use]
pub fn predict(entries: &[HistoryEntry], window: usize) -> Prediction {
    let values: Vec<f64> = last(entries, window).iter().map(|e| e.overall).collect();
    predict_values(&values)
}

/// Predict the next percentage of one domain
///
/// Entries that did not record the domain are skipped.
#[must_use]
pub fn predict_domain(entries: &[HistoryEntry], domain: &str, window: usize) -> Prediction {
    let values: Vec<f64> = entries
        .iter()
        .filter_map(|e| e.domain_percent(domain))
        .collect();
    let start = if window == 0 {
        0
    } else {
        values.len().saturating_sub(window)
    };
    predict_values(&values[start..])
}

fn last(entries: &[HistoryEntry], window: usize) -> &[HistoryEntry] {
    if window == 0 {
        entries
    } else {
        &entries[entries.len().saturating_sub(window)..]
    }
}

/// Least-squares line over (index, value), evaluated one step ahead
#[must_use]
pub fn predict_values(values: &[f64]) -> Prediction {
    match values {
        [] => Prediction {
            value: 0.0,
            confidence: 0.0,
        },
        [only] => Prediction {
            value: round1(only.clamp(0.0, 100.0)),
            confidence: SINGLE_POINT_CONFIDENCE,
        },
        _ => {
            let n = values.len() as f64;
            let mean_x = (n - 1.0) / 2.0;
            let mean_y = values.iter().sum::<f64>() / n;

            let (mut sxy, mut sxx) = (0.0, 0.0);
            for (i, y) in values.iter().enumerate() {
                let dx = i as f64 - mean_x;
                sxy += dx * (y - mean_y);
                sxx += dx * dx;
            }
            let slope = sxy / sxx;
            let intercept = mean_y - slope * mean_x;

            let variance = values
                .iter()
                .enumerate()
                .map(|(i, y)| {
                    let residual = y - (intercept + slope * i as f64);
                    residual * residual
                })
                .sum::<f64>()
                / n;

            Prediction {
                value: round1((intercept + slope * n).clamp(0.0, 100.0)),
                confidence: round1(100.0 / (1.0 + variance / 100.0)),
            }
        }
    }
}
