//! Changed-file lookup and revision metadata from git.

use crate::coverage::CoverageMap;
use crate::history::Revision;
use crate::result::{CovgateError, CovgateResult};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::process::Command;

/// Lists files changed relative to a base revision
pub trait DiffProvider {
    /// Module-relative paths changed since `base`
    fn changed_files(&self, base: &str) -> CovgateResult<Vec<String>>;
}

/// Commit and branch of the working tree
pub trait RevisionSource {
    fn commit(&self) -> String;

    fn branch(&self) -> String;

    fn revision(&self) -> Revision {
        Revision::new(self.commit(), self.branch())
    }
}

/// Runs `git` in the module root
#[derive(Debug, Clone)]
pub struct GitDiffProvider {
    root: PathBuf,
}

impl GitDiffProvider {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn git(&self, args: &[&str]) -> CovgateResult<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .output()
            .map_err(|e| CovgateError::collaborator("git", e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CovgateError::collaborator(
                "git",
                format!("git {} exited with {}: {}", args.join(" "), output.status, stderr.trim()),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn git_or_empty(&self, args: &[&str]) -> String {
        match self.git(args) {
            Ok(out) => out.trim().to_string(),
            Err(e) => {
                tracing::debug!(error = %e, "revision lookup failed");
                String::new()
            }
        }
    }
}

impl DiffProvider for GitDiffProvider {
    fn changed_files(&self, base: &str) -> CovgateResult<Vec<String>> {
        let range = format!("{base}...HEAD");
        let out = self.git(&["diff", "--name-only", "--relative", &range])?;
        let files: Vec<String> = out
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        tracing::debug!(base, changed = files.len(), "diff resolved");
        Ok(files)
    }
}

impl RevisionSource for GitDiffProvider {
    fn commit(&self) -> String {
        self.git_or_empty(&["rev-parse", "HEAD"])
    }

    fn branch(&self) -> String {
        self.git_or_empty(&["rev-parse", "--abbrev-ref", "HEAD"])
    }
}

/// Keep only the files listed as changed
#[must_use]
pub fn filter_changed(files: CoverageMap, changed: &[String]) -> CoverageMap {
    let changed: BTreeSet<String> = changed
        .iter()
        .map(|p| {
            let p = p.replace('\\', "/");
            p.strip_prefix("./").map(str::to_string).unwrap_or(p)
        })
        .collect();
    files
        .into_iter()
        .filter(|(path, _)| changed.contains(path))
        .collect()
}
