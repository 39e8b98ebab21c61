//! Native text profile parser.
//!
//! ```text
//! mode: set
//! example.com/app/core/engine.go:12.34,14.2 3 1
//! ```
//!
//! Each data line is one block: `file:start.col,end.col statements hits`.

use super::ProfileParser;
use crate::coverage::{CoverageMap, MergePolicy, ProfileFormat};
use crate::result::CovgateResult;
use regex::Regex;
use std::sync::OnceLock;

fn block_line() -> &'static Regex {
    static BLOCK: OnceLock<Regex> = OnceLock::new();
    BLOCK.get_or_init(|| {
        Regex::new(r"^(?P<file>.+):(\d+)\.(\d+),(\d+)\.(\d+) (?P<stmts>\d+) (?P<hits>\d+)$")
            .unwrap_or_else(|e| unreachable!("static regex is valid: {e}"))
    })
}

/// Parser for `mode: set|count|atomic` profiles
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeParser;

impl NativeParser {
    /// Create a new parser
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Extract the mode from the header line, if present
    #[must_use]
    pub fn parse_mode(content: &str) -> Option<&str> {
        content
            .lines()
            .next()
            .and_then(|line| line.trim().strip_prefix("mode:"))
            .map(str::trim)
            .filter(|mode| !mode.is_empty())
    }
}

impl ProfileParser for NativeParser {
    fn format(&self) -> ProfileFormat {
        ProfileFormat::Native
    }

    fn merge_policy(&self) -> MergePolicy {
        MergePolicy::Sum
    }

    fn parse_str(&self, content: &str) -> CovgateResult<CoverageMap> {
        let mut files = CoverageMap::new();

        for (index, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with("mode:") {
                continue;
            }

            let Some(caps) = block_line().captures(line) else {
                tracing::debug!(line = index + 1, "skipping malformed profile line");
                continue;
            };
            let (Ok(stmts), Ok(hits)) = (caps["stmts"].parse::<u64>(), caps["hits"].parse::<u64>())
            else {
                tracing::debug!(line = index + 1, "skipping profile line with bad counts");
                continue;
            };

            let stat = files.entry(caps["file"].to_string()).or_default();
            stat.total += stmts;
            if hits > 0 {
                stat.covered += stmts;
            }
        }

        Ok(files)
    }
}
