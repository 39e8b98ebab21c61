//! Coverage Profile Parsers
//!
//! One parser per supported report shape. Parsers are pure over the report
//! text: a malformed line is skipped, only unreadable files and undecodable
//! XML are errors.

mod cobertura;
mod jacoco;
mod lcov;
mod native;

pub use cobertura::CoberturaParser;
pub use jacoco::JacocoParser;
pub use lcov::LcovParser;
pub use native::NativeParser;

use super::{merge_into, CoverageMap, MergePolicy, ProfileFormat};
use crate::result::{CovgateError, CovgateResult};
use std::path::Path;

/// A parser for one coverage profile format
pub trait ProfileParser: Send + Sync + std::fmt::Debug {
    /// Format handled by this parser
    fn format(&self) -> ProfileFormat;

    /// How several profiles of this format are merged
    fn merge_policy(&self) -> MergePolicy;

    /// Parse profile content
    fn parse_str(&self, content: &str) -> CovgateResult<CoverageMap>;

    /// Parse a profile from disk
    fn parse_file(&self, path: &Path) -> CovgateResult<CoverageMap> {
        let content =
            std::fs::read_to_string(path).map_err(|e| CovgateError::parse(path, e.to_string()))?;
        self.parse_str(&content).map_err(|e| match e {
            CovgateError::Parse { message, .. } => CovgateError::parse(path, message),
            other => other,
        })
    }

    /// Parse several profiles of this format and merge them
    fn parse_all(&self, paths: &[&Path]) -> CovgateResult<CoverageMap> {
        let mut merged = CoverageMap::new();
        for path in paths {
            let parsed = self.parse_file(path)?;
            tracing::debug!(
                path = %path.display(),
                format = %self.format(),
                files = parsed.len(),
                "parsed profile"
            );
            merge_into(&mut merged, parsed, self.merge_policy());
        }
        Ok(merged)
    }
}

/// Attribute values in coverage XML are numeric but not always well-formed
pub(crate) fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;
    let raw = String::deserialize(deserializer)?;
    let trimmed = raw.trim();
    Ok(trimmed
        .parse::<u64>()
        .ok()
        .or_else(|| {
            trimmed
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && *v > 0.0)
                .map(|v| v as u64)
        })
        .unwrap_or(0))
}
