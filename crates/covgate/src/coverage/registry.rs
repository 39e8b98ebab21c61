//! Parser dispatch and multi-profile merging.

use super::parsers::{CoberturaParser, JacocoParser, LcovParser, NativeParser, ProfileParser};
use super::{detect_format_or_default, merge_into, CoverageMap, MergePolicy, ProfileFormat};
use crate::result::{CovgateError, CovgateResult};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Dispatches profiles to the parser for their detected format
#[derive(Debug)]
pub struct ParserRegistry {
    parsers: Vec<Box<dyn ProfileParser>>,
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserRegistry {
    /// Create a registry with all built-in parsers
    #[must_use]
    pub fn new() -> Self {
        Self {
            parsers: vec![
                Box::new(NativeParser::new()),
                Box::new(LcovParser::new()),
                Box::new(CoberturaParser::new()),
                Box::new(JacocoParser::new()),
            ],
        }
    }

    /// Parser registered for a format
    pub fn parser(&self, format: ProfileFormat) -> CovgateResult<&dyn ProfileParser> {
        self.parsers
            .iter()
            .find(|p| p.format() == format)
            .map(|p| &**p)
            .ok_or_else(|| {
                CovgateError::configuration(format!("no parser registered for {format}"))
            })
    }

    /// Parse one profile, detecting its format
    pub fn parse(&self, path: &Path) -> CovgateResult<CoverageMap> {
        let format = detect_format_or_default(path)?;
        tracing::debug!(path = %path.display(), %format, "dispatching profile");
        self.parser(format)?.parse_file(path)
    }

    /// Parse and merge several profiles
    ///
    /// Profiles of one format are merged with that format's policy; the
    /// per-format results are then summed.
    pub fn parse_all<P: AsRef<Path>>(&self, paths: &[P]) -> CovgateResult<CoverageMap> {
        let mut by_format: BTreeMap<ProfileFormat, Vec<PathBuf>> = BTreeMap::new();
        for path in paths {
            let path = path.as_ref();
            let format = detect_format_or_default(path)?;
            by_format.entry(format).or_default().push(path.to_path_buf());
        }

        let mut merged = CoverageMap::new();
        for (format, group) in &by_format {
            let refs: Vec<&Path> = group.iter().map(PathBuf::as_path).collect();
            let parsed = self.parser(*format)?.parse_all(&refs)?;
            tracing::debug!(%format, profiles = refs.len(), files = parsed.len(), "merged profiles");
            merge_into(&mut merged, parsed, MergePolicy::Sum);
        }
        Ok(merged)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::coverage::CoverageStat;

    #[test]
    fn test_every_format_has_a_parser() {
        let registry = ParserRegistry::new();
        for format in ProfileFormat::ALL {
            assert_eq!(registry.parser(format).unwrap().format(), format);
        }
    }

    #[test]
    fn test_parse_dispatches_on_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.xml");
        std::fs::write(&path, "mode: set\na.go:1.1,2.2 4 1\n").unwrap();

        let map = ParserRegistry::new().parse(&path).unwrap();
        assert_eq!(map["a.go"], CoverageStat::new(4, 4));
    }

    #[test]
    fn test_unresolved_xml_defaults_to_native() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.xml");
        std::fs::write(&path, "").unwrap();
        assert!(ParserRegistry::new().parse(&path).unwrap().is_empty());
    }

    #[test]
    fn test_parse_all_mixed_formats() {
        let dir = tempfile::tempdir().unwrap();
        let lcov_a = dir.path().join("a.info");
        let lcov_b = dir.path().join("b.info");
        let native = dir.path().join("coverage.out");
        std::fs::write(&lcov_a, "SF:x.c\nDA:1,1\nDA:2,0\nend_of_record\n").unwrap();
        std::fs::write(&lcov_b, "SF:x.c\nDA:1,1\nDA:2,1\nend_of_record\n").unwrap();
        std::fs::write(&native, "mode: set\nx.c:1.1,1.9 3 1\n").unwrap();

        let map = ParserRegistry::new()
            .parse_all(&[&lcov_a, &lcov_b, &native])
            .unwrap();
        // lcov max (2/2) then summed with native (3/3)
        assert_eq!(map["x.c"], CoverageStat::new(5, 5));
    }

    #[test]
    fn test_parse_all_empty() {
        let paths: Vec<PathBuf> = Vec::new();
        assert!(ParserRegistry::new().parse_all(&paths).unwrap().is_empty());
    }

    #[test]
    fn test_parse_all_missing_profile_fails() {
        let err = ParserRegistry::new()
            .parse_all(&["/no/such/profile.out"])
            .unwrap_err();
        assert!(matches!(err, CovgateError::Parse { .. }));
    }
}
