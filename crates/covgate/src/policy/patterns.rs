//! Glob pattern sets over module-relative paths.

use crate::result::{CovgateError, CovgateResult};
use glob::{MatchOptions, Pattern};

const OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone)]
struct Entry {
    pattern: Pattern,
    /// Literal prefix for patterns that name a directory
    prefix: Option<String>,
    /// Patterns without a slash also match bare file names
    basename: bool,
}

/// A compiled set of glob patterns
///
/// A path matches when any pattern matches it. Patterns without glob
/// characters also match everything below them, and patterns without a `/`
/// match a file name at any depth.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    entries: Vec<Entry>,
}

impl PatternSet {
    /// Compile patterns; an invalid glob is a configuration error
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> CovgateResult<Self> {
        let mut entries = Vec::with_capacity(patterns.len());
        for raw in patterns {
            let raw = raw.as_ref().trim();
            let normalized = raw.trim_start_matches("./").trim_end_matches('/');
            if normalized.is_empty() {
                continue;
            }
            let pattern = Pattern::new(normalized).map_err(|e| {
                CovgateError::configuration(format!("invalid pattern {raw:?}: {e}"))
            })?;
            let is_literal = !normalized.contains(['*', '?', '[']);
            entries.push(Entry {
                pattern,
                prefix: is_literal.then(|| format!("{normalized}/")),
                basename: !normalized.contains('/'),
            });
        }
        Ok(Self { entries })
    }

    /// Whether the set has no patterns
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a slash-separated relative path matches any pattern
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        let path = path.trim_start_matches("./");
        let file_name = path.rsplit('/').next().unwrap_or(path);
        self.entries.iter().any(|entry| {
            entry.pattern.matches_with(path, OPTIONS)
                || entry.prefix.as_deref().is_some_and(|p| path.starts_with(p))
                || (entry.basename && entry.pattern.matches_with(file_name, OPTIONS))
        })
    }
}
