//! JaCoCo XML parser.
//!
//! ```xml
//! <report name="service">
//!   <package name="com/example/core">
//!     <class name="com/example/core/Engine" sourcefilename="Engine.java">...</class>
//!     <sourcefile name="Engine.java">
//!       <line nr="12" mi="0" ci="4" mb="0" cb="0"/>
//!     </sourcefile>
//!   </package>
//! </report>
//! ```
//!
//! Line coverage is read from `sourcefile` elements: a line is instrumented
//! when it has any instructions (`mi + ci > 0`) and covered when at least
//! one instruction ran (`ci > 0`). Files are keyed `package/sourcefile`;
//! the path normalizer places those keys under `src/main/java` and the
//! other JVM source roots.

use super::{lenient_u64, ProfileParser};
use crate::coverage::{CoverageMap, CoverageStat, MergePolicy, ProfileFormat};
use crate::result::{CovgateError, CovgateResult};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
struct Group {
    #[serde(default, rename = "group")]
    groups: Vec<Group>,
    #[serde(default, rename = "package")]
    packages: Vec<Package>,
}

#[derive(Debug, Default, Deserialize)]
struct Package {
    #[serde(default, rename = "@name")]
    name: String,
    #[serde(default, rename = "sourcefile")]
    sourcefiles: Vec<SourceFile>,
}

#[derive(Debug, Default, Deserialize)]
struct SourceFile {
    #[serde(default, rename = "@name")]
    name: String,
    #[serde(default, rename = "line")]
    lines: Vec<Line>,
}

#[derive(Debug, Default, Deserialize)]
struct Line {
    #[serde(default, rename = "@mi", deserialize_with = "lenient_u64")]
    missed: u64,
    #[serde(default, rename = "@ci", deserialize_with = "lenient_u64")]
    covered: u64,
}

impl SourceFile {
    fn stat(&self) -> CoverageStat {
        let instrumented = self.lines.iter().filter(|l| l.missed + l.covered > 0);
        let (covered, total) = instrumented.fold((0, 0), |(c, t), line| {
            (c + u64::from(line.covered > 0), t + 1)
        });
        CoverageStat::new(covered, total)
    }
}

fn collect(group: &Group, files: &mut CoverageMap) {
    for nested in &group.groups {
        collect(nested, files);
    }
    for package in &group.packages {
        for source in &package.sourcefiles {
            if source.name.is_empty() {
                continue;
            }
            let key = if package.name.is_empty() {
                source.name.clone()
            } else {
                format!("{}/{}", package.name.trim_end_matches('/'), source.name)
            };
            files.entry(key).or_default().add(source.stat());
        }
    }
}

/// Parser for JaCoCo XML reports
#[derive(Debug, Clone, Copy, Default)]
pub struct JacocoParser;

impl JacocoParser {
    /// Create a new parser
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ProfileParser for JacocoParser {
    fn format(&self) -> ProfileFormat {
        ProfileFormat::Jacoco
    }

    fn merge_policy(&self) -> MergePolicy {
        MergePolicy::Sum
    }

    fn parse_str(&self, content: &str) -> CovgateResult<CoverageMap> {
        let mut files = CoverageMap::new();
        if content.trim().is_empty() {
            return Ok(files);
        }

        let report: Group = quick_xml::de::from_str(content)
            .map_err(|e| CovgateError::parse(Path::new("<jacoco>"), e.to_string()))?;
        collect(&report, &mut files);
        Ok(files)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const REPORT: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<!DOCTYPE report PUBLIC "-//JACOCO//DTD Report 1.1//EN" "report.dtd">
<report name="service">
  <sessioninfo id="host-1" start="1" dump="2"/>
  <package name="com/example/core">
    <class name="com/example/core/Engine" sourcefilename="Engine.java">
      <method name="run" desc="()V" line="12"><counter type="LINE" missed="1" covered="2"/></method>
    </class>
    <sourcefile name="Engine.java">
      <line nr="12" mi="0" ci="4" mb="0" cb="0"/>
      <line nr="13" mi="3" ci="0" mb="0" cb="0"/>
      <line nr="14" mi="1" ci="2" mb="1" cb="1"/>
      <line nr="15" mi="0" ci="0" mb="0" cb="0"/>
      <counter type="LINE" missed="1" covered="2"/>
    </sourcefile>
    <counter type="LINE" missed="1" covered="2"/>
  </package>
  <counter type="LINE" missed="1" covered="2"/>
</report>
"#;

    #[test]
    fn test_sourcefile_lines() {
        let map = JacocoParser::new().parse_str(REPORT).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(
            map["com/example/core/Engine.java"],
            CoverageStat::new(2, 3)
        );
    }

    #[test]
    fn test_groups_are_walked() {
        let xml = r#"<report name="multi">
          <group name="module-a">
            <package name="a"><sourcefile name="A.java"><line nr="1" mi="0" ci="1"/></sourcefile></package>
            <group name="nested">
              <package name="b"><sourcefile name="B.java"><line nr="1" mi="2" ci="0"/></sourcefile></package>
            </group>
          </group>
        </report>"#;
        let map = JacocoParser::new().parse_str(xml).unwrap();
        assert_eq!(map["a/A.java"], CoverageStat::new(1, 1));
        assert_eq!(map["b/B.java"], CoverageStat::new(0, 1));
    }

    #[test]
    fn test_default_package() {
        let xml = r#"<report name="r"><package name=""><sourcefile name="Main.java"><line nr="3" mi="0" ci="2"/></sourcefile></package></report>"#;
        let map = JacocoParser::new().parse_str(xml).unwrap();
        assert_eq!(map["Main.java"], CoverageStat::new(1, 1));
    }

    #[test]
    fn test_malformed_report_is_error() {
        let err = JacocoParser::new()
            .parse_str("<report><package></report>")
            .unwrap_err();
        assert!(matches!(err, CovgateError::Parse { .. }));
    }
}
