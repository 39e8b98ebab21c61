//! LCOV tracefile parser.
//!
//! ## LCOV Format
//!
//! ```text
//! TN:<test name>
//! SF:<source file>
//! FN:<line>,<function name>
//! FNDA:<execution count>,<function name>
//! DA:<line>,<execution count>[,<checksum>]
//! LF:<lines found>
//! LH:<lines hit>
//! end_of_record
//! ```
//!
//! Only `SF`, `DA`, `LF`, `LH` and `end_of_record` are read.

use super::ProfileParser;
use crate::coverage::{CoverageMap, CoverageStat, MergePolicy, ProfileFormat};
use crate::result::CovgateResult;

/// Parser for LCOV tracefiles
#[derive(Debug, Clone, Copy, Default)]
pub struct LcovParser;

impl LcovParser {
    /// Create a new parser
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[derive(Debug, Default)]
struct Record {
    file: String,
    covered: u64,
    total: u64,
    lines_found: Option<u64>,
    lines_hit: Option<u64>,
}

impl Record {
    fn open(file: &str) -> Self {
        Self {
            file: file.to_string(),
            ..Self::default()
        }
    }

    fn into_stat(self) -> (String, CoverageStat) {
        let total = self.lines_found.map_or(self.total, |lf| lf.max(self.total));
        let covered = self.lines_hit.map_or(self.covered, |lh| lh.max(self.covered));
        (self.file, CoverageStat::new(covered, total))
    }
}

fn flush(files: &mut CoverageMap, record: Record) {
    if record.file.is_empty() {
        return;
    }
    let (file, stat) = record.into_stat();
    let entry = files.entry(file).or_default();
    *entry = entry.merged(stat, MergePolicy::Max);
}

impl ProfileParser for LcovParser {
    fn format(&self) -> ProfileFormat {
        ProfileFormat::Lcov
    }

    fn merge_policy(&self) -> MergePolicy {
        MergePolicy::Max
    }

    fn parse_str(&self, content: &str) -> CovgateResult<CoverageMap> {
        let mut files = CoverageMap::new();
        let mut current: Option<Record> = None;

        for line in content.lines() {
            let line = line.trim();

            if let Some(path) = line.strip_prefix("SF:") {
                if let Some(open) = current.take() {
                    flush(&mut files, open);
                }
                current = Some(Record::open(path.trim()));
            } else if line == "end_of_record" {
                if let Some(open) = current.take() {
                    flush(&mut files, open);
                }
            } else if let Some(data) = line.strip_prefix("DA:") {
                let Some(record) = current.as_mut() else {
                    continue;
                };
                let mut fields = data.split(',');
                let line_no = fields.next().and_then(|f| f.trim().parse::<u64>().ok());
                let hits = fields.next().and_then(|f| parse_hits(f.trim()));
                match (line_no, hits) {
                    (Some(_), Some(hits)) => {
                        record.total += 1;
                        if hits > 0 {
                            record.covered += 1;
                        }
                    }
                    _ => tracing::debug!(line, "skipping malformed DA line"),
                }
            } else if let Some(n) = line.strip_prefix("LF:") {
                if let (Some(record), Ok(n)) = (current.as_mut(), n.trim().parse::<u64>()) {
                    record.lines_found = Some(n);
                }
            } else if let Some(n) = line.strip_prefix("LH:") {
                if let (Some(record), Ok(n)) = (current.as_mut(), n.trim().parse::<u64>()) {
                    record.lines_hit = Some(n);
                }
            }
        }

        if let Some(open) = current.take() {
            flush(&mut files, open);
        }

        Ok(files)
    }
}

/// Hit counts are integers, but some generators emit negative or float values
fn parse_hits(raw: &str) -> Option<u64> {
    if let Ok(n) = raw.parse::<u64>() {
        return Some(n);
    }
    if let Ok(n) = raw.parse::<i64>() {
        return Some(n.max(0) as u64);
    }
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| if v > 0.0 { v.ceil() as u64 } else { 0 })
}
