//! Output formatting

use crate::error::CliResult;
use console::{style, Style, Term};
use covgate::{Direction, EvaluationResult, HistoryEntry, Status, Trend, TrendSummary};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON on stdout
    Json,
}

/// Writes status lines to the terminal
#[derive(Debug)]
pub struct Reporter {
    term: Term,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl Reporter {
    /// Create a new reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stdout(),
            use_color,
            quiet,
        }
    }

    /// Print a rendered block as-is
    pub fn block(&self, text: &str) {
        if self.quiet {
            return;
        }
        let _ = self.term.write_str(text);
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("✓").green().bold().to_string()
        } else {
            "PASS".to_string()
        };

        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // Failures print even in quiet mode
        let prefix = if self.use_color {
            style("✗").red().bold().to_string()
        } else {
            "FAIL".to_string()
        };

        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("ℹ").blue().bold().to_string()
        } else {
            "INFO".to_string()
        };

        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }
}

/// Pretty JSON for `--format json`
pub fn to_json<T: Serialize>(value: &T) -> CliResult<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn status_style(status: Status) -> Style {
    match status {
        Status::Pass => Style::new().green().bold(),
        Status::Warn => Style::new().yellow().bold(),
        Status::Fail => Style::new().red().bold(),
    }
}

fn paint(text: &str, status: Status, use_color: bool) -> String {
    if use_color {
        status_style(status).apply_to(text).to_string()
    } else {
        text.to_string()
    }
}

/// Domain table, file rules, overall line and warnings
#[must_use]
pub fn render_check(result: &EvaluationResult, use_color: bool) -> String {
    let mut out = String::new();

    if result.domains.is_empty() {
        out.push_str("No domains evaluated\n");
    } else {
        let width = result
            .domains
            .iter()
            .map(|d| d.name.len())
            .max()
            .unwrap_or(0)
            .max("DOMAIN".len());
        let _ = writeln!(out, "{:<width$}  {:>8}  {:>8}  STATUS", "DOMAIN", "COVERAGE", "REQUIRED");
        for domain in &result.domains {
            let label = paint(domain.status.label(), domain.status, use_color);
            let _ = write!(
                out,
                "{:<width$}  {:>7.1}%  {:>7.1}%  {label}",
                domain.name, domain.percent, domain.required
            );
            if domain.status == Status::Fail {
                let _ = write!(out, " (-{:.1})", domain.shortfall);
            }
            out.push('\n');
        }
    }

    if !result.files.is_empty() {
        out.push_str("\nFile rules:\n");
        for file in &result.files {
            let status = if file.passed { Status::Pass } else { Status::Fail };
            let _ = writeln!(
                out,
                "  {}  {:.1}% / {:.1}%  {}",
                file.path,
                file.percent,
                file.required,
                paint(status.label(), status, use_color)
            );
        }
    }

    if !result.domains.is_empty() {
        let overall = result.overall();
        let _ = writeln!(
            out,
            "\nOverall: {:.1}% ({}/{})",
            overall.percent(),
            overall.covered,
            overall.total
        );
    }

    for warning in &result.warnings {
        let prefix = if use_color {
            style("warning:").yellow().to_string()
        } else {
            "warning:".to_string()
        };
        let _ = writeln!(out, "{prefix} {warning}");
    }

    out
}

fn trend_cell(trend: Trend, use_color: bool) -> String {
    let text = format!("{} {:+.1}", trend.direction.symbol(), trend.delta);
    if !use_color {
        return text;
    }
    match trend.direction {
        Direction::Up => style(text).green().to_string(),
        Direction::Down => style(text).red().to_string(),
        Direction::Stable => text,
    }
}

/// One line describing a recorded entry
#[must_use]
pub fn render_entry(entry: &HistoryEntry) -> String {
    let mut line = format!(
        "{:.1}% at {}",
        entry.overall,
        entry.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    );
    if !entry.commit.is_empty() {
        let short: String = entry.commit.chars().take(12).collect();
        let _ = write!(line, " ({short}");
        if !entry.branch.is_empty() {
            let _ = write!(line, " on {}", entry.branch);
        }
        line.push(')');
    }
    line
}

/// Latest entry, per-domain trends, window statistics and predictions
#[must_use]
pub fn render_trend(summary: &TrendSummary, use_color: bool) -> String {
    let mut out = String::new();
    let label = if summary.current { "Current" } else { "Latest" };
    let _ = writeln!(out, "{label}: {}", render_entry(&summary.latest));
    let _ = writeln!(
        out,
        "Overall: {:.1}%  {}",
        summary.latest.overall,
        trend_cell(summary.report.overall, use_color)
    );

    if !summary.report.domains.is_empty() {
        out.push('\n');
        let width = summary
            .report
            .domains
            .keys()
            .map(String::len)
            .max()
            .unwrap_or(0);
        for (name, trend) in &summary.report.domains {
            let percent = summary.latest.domain_percent(name).unwrap_or(0.0);
            let _ = write!(
                out,
                "  {name:<width$}  {percent:>5.1}%  {}",
                trend_cell(*trend, use_color)
            );
            if let Some(prediction) = summary.domain_predictions.get(name) {
                let _ = write!(
                    out,
                    "  next ~{:.1}% ({:.0}% confidence)",
                    prediction.value, prediction.confidence
                );
            }
            out.push('\n');
        }
    }

    if let Some(stats) = &summary.stats {
        let _ = writeln!(
            out,
            "\nLast {} entries: high {:.1}%  low {:.1}%  avg {:.1}%  ({} up, {} down, {} stable)",
            stats.count, stats.highest, stats.lowest, stats.average, stats.up, stats.down, stats.stable
        );
        let _ = writeln!(
            out,
            "Volatility {:.2}  consistency {:.1}",
            stats.volatility, stats.consistency_score
        );
    }

    let _ = writeln!(
        out,
        "Predicted next: {:.1}% ({:.0}% confidence)",
        summary.prediction.value, summary.prediction.confidence
    );
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use covgate::{CoverageStat, DomainResult, FileResult, History};
    use std::collections::BTreeMap;

    fn domain(name: &str, covered: u64, total: u64, required: f64) -> DomainResult {
        let stat = CoverageStat::new(covered, total);
        let percent = stat.percent();
        let status = Status::classify(percent, required, None);
        DomainResult {
            name: name.to_string(),
            stat,
            percent,
            required,
            warn: None,
            status,
            shortfall: if status == Status::Fail {
                required - percent
            } else {
                0.0
            },
        }
    }

    fn result(domains: Vec<DomainResult>) -> EvaluationResult {
        let passed = domains.iter().all(|d| d.status != Status::Fail);
        EvaluationResult {
            domains,
            files: Vec::new(),
            passed,
            warnings: Vec::new(),
        }
    }

    mod output_format_tests {
        use super::*;

        #[test]
        fn test_default_format() {
            assert_eq!(OutputFormat::default(), OutputFormat::Text);
        }
    }

    mod render_check_tests {
        use super::*;

        #[test]
        fn test_domain_rows() {
            let text = render_check(
                &result(vec![domain("core", 85, 100, 80.0), domain("api", 755, 1000, 80.0)]),
                false,
            );
            assert!(text.contains("DOMAIN"));
            assert!(text.contains("core"));
            assert!(text.contains("85.0%"));
            assert!(text.contains("PASS"));
            assert!(text.contains("FAIL (-4.5)"));
            assert!(text.contains("Overall: 76.4% (840/1100)"));
        }

        #[test]
        fn test_no_color_has_no_escapes() {
            let text = render_check(&result(vec![domain("core", 1, 2, 80.0)]), false);
            assert!(!text.contains('\u{1b}'));
        }

        #[test]
        fn test_vacuous_result() {
            let text = render_check(&EvaluationResult::vacuous("no changed files"), false);
            assert!(text.contains("No domains evaluated"));
            assert!(text.contains("warning: no changed files"));
            assert!(!text.contains("Overall"));
        }

        #[test]
        fn test_file_rules_listed() {
            let mut res = result(vec![domain("core", 9, 10, 80.0)]);
            res.files.push(FileResult {
                path: "core/parser.go".into(),
                stat: CoverageStat::new(1, 2),
                percent: 50.0,
                required: 90.0,
                passed: false,
                shortfall: 40.0,
            });
            let text = render_check(&res, false);
            assert!(text.contains("File rules:"));
            assert!(text.contains("core/parser.go  50.0% / 90.0%  FAIL"));
        }
    }

    mod render_trend_tests {
        use super::*;
        use covgate::history::DomainSnapshot;

        fn entry(minute: u32, overall: f64) -> HistoryEntry {
            let mut domains = BTreeMap::new();
            domains.insert(
                "core".to_string(),
                DomainSnapshot {
                    percent: overall,
                    min: 80.0,
                    status: Status::classify(overall, 80.0, None),
                },
            );
            HistoryEntry {
                timestamp: Utc.with_ymd_and_hms(2026, 3, 1, 12, minute, 0).unwrap(),
                commit: "0123456789abcdef".into(),
                branch: "main".into(),
                overall,
                domains,
            }
        }

        #[test]
        fn test_entry_line() {
            let line = render_entry(&entry(5, 81.3));
            assert_eq!(line, "81.3% at 2026-03-01 12:05:00 UTC (0123456789ab on main)");
        }

        #[test]
        fn test_trend_text() {
            let history: History = vec![entry(0, 80.0), entry(1, 85.0)].into_iter().collect();
            let summary = covgate::summarize(&history, None, 10).unwrap();
            let text = render_trend(&summary, false);
            assert!(text.starts_with("Latest: 85.0%"));
            assert!(text.contains("Overall: 85.0%  ↑ +5.0"));
            assert!(text.contains("core"));
            assert!(text.contains("Predicted next:"));
            assert!(text.contains("Last 2 entries"));
        }

        #[test]
        fn test_trend_text_for_current_run() {
            let history: History = vec![entry(0, 80.0)].into_iter().collect();
            let summary = covgate::summarize(&history, Some(entry(1, 78.0)), 10).unwrap();
            let text = render_trend(&summary, false);
            assert!(text.starts_with("Current: 78.0%"));
            assert!(text.contains("Overall: 78.0%  ↓ -2.0"));
        }
    }

    mod reporter_tests {
        use super::*;

        #[test]
        fn test_new_reporter() {
            let reporter = Reporter::new(false, true);
            assert!(!reporter.use_color);
            assert!(reporter.quiet);
        }

        #[test]
        fn test_json_output() {
            let json = to_json(&result(vec![domain("core", 1, 2, 50.0)])).unwrap();
            let value: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert_eq!(value["passed"], true);
            assert_eq!(value["domains"][0]["name"], "core");
        }
    }
}
