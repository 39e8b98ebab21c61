//! Cobertura XML parser.
//!
//! ## Cobertura XML Format
//!
//! ```xml
//! <coverage line-rate="0.8" branch-rate="0.7" version="1.0">
//!   <packages>
//!     <package name="src">
//!       <classes>
//!         <class name="Game" filename="src/game.rs">
//!           <methods>
//!             <method name="update"><lines><line number="10" hits="5"/></lines></method>
//!           </methods>
//!           <lines>
//!             <line number="10" hits="5"/>
//!           </lines>
//!         </class>
//!       </classes>
//!     </package>
//!   </packages>
//! </coverage>
//! ```

use super::{lenient_u64, ProfileParser};
use crate::coverage::{CoverageMap, CoverageStat, MergePolicy, ProfileFormat};
use crate::result::{CovgateError, CovgateResult};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
struct CoverageDoc {
    #[serde(default)]
    packages: Packages,
}

#[derive(Debug, Default, Deserialize)]
struct Packages {
    #[serde(default, rename = "package")]
    items: Vec<Package>,
}

#[derive(Debug, Default, Deserialize)]
struct Package {
    #[serde(default)]
    classes: Classes,
}

#[derive(Debug, Default, Deserialize)]
struct Classes {
    #[serde(default, rename = "class")]
    items: Vec<Class>,
}

#[derive(Debug, Default, Deserialize)]
struct Class {
    #[serde(default, rename = "@filename")]
    filename: Option<String>,
    #[serde(default)]
    methods: Methods,
    #[serde(default)]
    lines: Lines,
}

#[derive(Debug, Default, Deserialize)]
struct Methods {
    #[serde(default, rename = "method")]
    items: Vec<Method>,
}

#[derive(Debug, Default, Deserialize)]
struct Method {
    #[serde(default)]
    lines: Lines,
}

#[derive(Debug, Default, Deserialize)]
struct Lines {
    #[serde(default, rename = "line")]
    items: Vec<Line>,
}

#[derive(Debug, Default, Deserialize)]
struct Line {
    #[serde(default, rename = "@number", deserialize_with = "lenient_u64")]
    number: u64,
    #[serde(default, rename = "@hits", deserialize_with = "lenient_u64")]
    hits: u64,
}

impl Class {
    /// Line coverage of one class, deduplicating class- and method-level lines
    fn stat(&self) -> CoverageStat {
        let mut lines: BTreeMap<u64, bool> = BTreeMap::new();
        let method_lines = self.methods.items.iter().flat_map(|m| m.lines.items.iter());
        for line in self.lines.items.iter().chain(method_lines) {
            let hit = lines.entry(line.number).or_insert(false);
            *hit |= line.hits > 0;
        }
        let covered = lines.values().filter(|hit| **hit).count() as u64;
        CoverageStat::new(covered, lines.len() as u64)
    }
}

/// Parser for Cobertura XML reports
#[derive(Debug, Clone, Copy, Default)]
pub struct CoberturaParser;

impl CoberturaParser {
    /// Create a new parser
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ProfileParser for CoberturaParser {
    fn format(&self) -> ProfileFormat {
        ProfileFormat::Cobertura
    }

    fn merge_policy(&self) -> MergePolicy {
        MergePolicy::Sum
    }

    fn parse_str(&self, content: &str) -> CovgateResult<CoverageMap> {
        let mut files = CoverageMap::new();
        if content.trim().is_empty() {
            return Ok(files);
        }

        let doc: CoverageDoc = quick_xml::de::from_str(content)
            .map_err(|e| CovgateError::parse(Path::new("<cobertura>"), e.to_string()))?;

        for class in doc
            .packages
            .items
            .iter()
            .flat_map(|p| p.classes.items.iter())
        {
            let Some(filename) = class.filename.as_deref().filter(|f| !f.is_empty()) else {
                tracing::debug!("skipping class without filename");
                continue;
            };
            files.entry(filename.to_string()).or_default().add(class.stat());
        }

        Ok(files)
    }
}
