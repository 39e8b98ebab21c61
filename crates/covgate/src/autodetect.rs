//! Project autodetection.
//!
//! An ordered rule table maps marker files to languages. Starting from a
//! directory, the walk checks every rule, then moves to the parent, for at
//! most [`MAX_PARENT_DEPTH`] parents. The nearest directory with a marker
//! wins; within one directory the first rule in table order wins.

use crate::config::Config;
use crate::policy::DomainSpec;
use crate::resolver::read_go_module;
use crate::result::{CovgateError, CovgateResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Parent directories visited beyond the starting one
pub const MAX_PARENT_DEPTH: usize = 5;

/// Threshold given to generated domains
pub const DETECTED_DEFAULT_MIN: f64 = 75.0;

/// Top-level directories that never become domains
const SKIP_DIRS: &[&str] = &["vendor", "target", "node_modules", "testdata"];

/// Project language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Go,
    Rust,
    JavaScript,
    Python,
    Java,
}

impl Language {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Go => "go",
            Self::Rust => "rust",
            Self::JavaScript => "javascript",
            Self::Python => "python",
            Self::Java => "java",
        }
    }

    /// Where the language's usual tooling writes coverage
    #[must_use]
    pub const fn default_profile(self) -> &'static str {
        match self {
            Self::Go => "coverage.out",
            Self::Rust => "lcov.info",
            Self::JavaScript => "coverage/lcov.info",
            Self::Python => "coverage.xml",
            Self::Java => "target/site/jacoco/jacoco.xml",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct Rule {
    language: Language,
    markers: &'static [&'static str],
}

const RULES: &[Rule] = &[
    Rule {
        language: Language::Go,
        markers: &["go.mod"],
    },
    Rule {
        language: Language::Rust,
        markers: &["Cargo.toml"],
    },
    Rule {
        language: Language::JavaScript,
        markers: &["package.json"],
    },
    Rule {
        language: Language::Python,
        markers: &["pyproject.toml", "setup.py"],
    },
    Rule {
        language: Language::Java,
        markers: &["pom.xml", "build.gradle"],
    },
];

/// What autodetection found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub language: Language,
    pub module_root: PathBuf,
    /// Import-path prefix (Go modules only)
    pub module_path: String,
}

/// Produces a configuration when none is present
pub trait Autodetector {
    /// Identify the project
    fn detect(&self) -> CovgateResult<Detection>;

    /// Build a default configuration for the project
    fn detect_config(&self) -> CovgateResult<Config>;
}

/// Walks the filesystem from a starting directory
#[derive(Debug, Clone)]
pub struct FsAutodetector {
    start: PathBuf,
}

impl FsAutodetector {
    #[must_use]
    pub fn new(start: impl Into<PathBuf>) -> Self {
        Self {
            start: start.into(),
        }
    }
}

impl Autodetector for FsAutodetector {
    fn detect(&self) -> CovgateResult<Detection> {
        let start = fs::canonicalize(&self.start).map_err(|e| {
            CovgateError::resolution(format!("cannot read {}: {e}", self.start.display()))
        })?;

        let mut dir: Option<&Path> = Some(&start);
        for _ in 0..=MAX_PARENT_DEPTH {
            let Some(current) = dir else { break };
            if let Some(language) = match_rules(current) {
                let module_path = match language {
                    Language::Go => read_go_module(current).unwrap_or_default(),
                    _ => String::new(),
                };
                tracing::debug!(%language, root = %current.display(), "project detected");
                return Ok(Detection {
                    language,
                    module_root: current.to_path_buf(),
                    module_path,
                });
            }
            dir = current.parent();
        }

        Err(CovgateError::resolution(format!(
            "no project marker found in {} or its {MAX_PARENT_DEPTH} parent directories",
            start.display()
        )))
    }

    fn detect_config(&self) -> CovgateResult<Config> {
        let detection = self.detect()?;
        let mut config = Config::default();
        config.policy.default.min = DETECTED_DEFAULT_MIN;
        config.policy.domains = top_level_domains(&detection.module_root)?;
        config.profiles = vec![PathBuf::from(detection.language.default_profile())];
        Ok(config)
    }
}

fn match_rules(dir: &Path) -> Option<Language> {
    RULES
        .iter()
        .find(|rule| rule.markers.iter().any(|m| dir.join(m).is_file()))
        .map(|rule| rule.language)
}

/// One domain per visible top-level directory, or a single `all` domain
fn top_level_domains(root: &Path) -> CovgateResult<Vec<DomainSpec>> {
    let mut names: Vec<String> = fs::read_dir(root)?
        .filter_map(Result::ok)
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .filter(|name| !name.starts_with('.') && !SKIP_DIRS.contains(&name.as_str()))
        .collect();
    names.sort();

    if names.is_empty() {
        return Ok(vec![DomainSpec::new("all", &["./..."])]);
    }
    Ok(names
        .iter()
        .map(|name| DomainSpec::new(name.as_str(), &[format!("./{name}/...").as_str()]))
        .collect())
}
