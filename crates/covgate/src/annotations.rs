//! Source annotations.
//!
//! A comment near the top of a source file can take the file out of every
//! domain or pin it to one:
//!
//! ```text
//! // covgate:ignore
//! // covgate:domain=core
//! ```

use crate::policy::{Annotation, AnnotationMap};
use crate::result::CovgateResult;
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::OnceLock;

/// Lines read from the top of each file
pub const SCAN_LINES: usize = 50;

/// Produces per-file annotations
pub trait AnnotationScanner {
    /// Annotations for `files` (module-relative paths) under `module_root`
    fn scan(&self, module_root: &Path, files: &[String]) -> CovgateResult<AnnotationMap>;
}

/// Reads annotation comments from source files
#[derive(Debug, Clone, Copy)]
pub struct SourceAnnotationScanner {
    max_lines: usize,
}

impl Default for SourceAnnotationScanner {
    fn default() -> Self {
        Self {
            max_lines: SCAN_LINES,
        }
    }
}

impl SourceAnnotationScanner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Change how many leading lines are read
    #[must_use]
    pub const fn with_max_lines(mut self, max_lines: usize) -> Self {
        self.max_lines = max_lines;
        self
    }

    fn scan_file(&self, path: &Path) -> Option<Annotation> {
        let file = File::open(path).ok()?;
        let mut annotation = Annotation::default();

        for line in BufReader::new(file).lines().take(self.max_lines) {
            let Ok(line) = line else { break };
            let Some(comment) = comment_body(&line) else {
                continue;
            };
            if ignore_re().is_match(comment) {
                annotation.ignore = true;
            }
            if let Some(caps) = domain_re().captures(comment) {
                annotation.domain_override = Some(caps[1].to_string());
            }
        }

        (annotation.ignore || annotation.domain_override.is_some()).then_some(annotation)
    }
}

impl AnnotationScanner for SourceAnnotationScanner {
    fn scan(&self, module_root: &Path, files: &[String]) -> CovgateResult<AnnotationMap> {
        let mut annotations = AnnotationMap::new();
        for file in files {
            if let Some(annotation) = self.scan_file(&module_root.join(file)) {
                tracing::debug!(file = %file, ?annotation, "annotation found");
                annotations.insert(file.clone(), annotation);
            }
        }
        Ok(annotations)
    }
}

/// Text after a line-comment marker, if the line is a comment
fn comment_body(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    ["//", "#", "/*", "*", "--", "<!--"]
        .iter()
        .find_map(|marker| trimmed.strip_prefix(marker))
}

fn ignore_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\bcovgate:ignore\b").unwrap_or_else(|e| unreachable!("static regex: {e}"))
    })
}

fn domain_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\bcovgate:domain=([A-Za-z0-9_.\-]+)")
            .unwrap_or_else(|e| unreachable!("static regex: {e}"))
    })
}
