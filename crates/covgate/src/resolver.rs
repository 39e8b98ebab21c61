//! Domain directory resolution.

use crate::normalize::clean;
use crate::policy::{DomainDirectories, DomainSpec};
use crate::result::{CovgateError, CovgateResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Turns domain match patterns into directories
pub trait DomainResolver {
    /// Directories owned by each domain
    fn resolve(&self, domains: &[DomainSpec]) -> CovgateResult<DomainDirectories>;

    /// Absolute module root
    fn module_root(&self) -> &Path;

    /// Import-path prefix of the module (empty when the language has none)
    fn module_path(&self) -> &str;
}

/// Resolves patterns against the filesystem
///
/// `./internal/core/...` and `internal/core` both name the `internal/core`
/// directory. Patterns with glob characters expand to every matching
/// directory.
#[derive(Debug, Clone)]
pub struct FsDomainResolver {
    root: PathBuf,
    module_path: String,
}

impl FsDomainResolver {
    /// Create a resolver rooted at `root`, reading the module path from `go.mod`
    pub fn new(root: impl AsRef<Path>) -> CovgateResult<Self> {
        let root = root.as_ref();
        let root = fs::canonicalize(root).map_err(|e| {
            CovgateError::resolution(format!("module root {}: {e}", root.display()))
        })?;
        let module_path = read_go_module(&root).unwrap_or_default();
        Ok(Self { root, module_path })
    }

    /// Override the module path
    #[must_use]
    pub fn with_module_path(mut self, module_path: impl Into<String>) -> Self {
        self.module_path = module_path.into();
        self
    }

    fn expand(&self, pattern: &str) -> CovgateResult<Vec<PathBuf>> {
        let trimmed = pattern.trim();
        let trimmed = trimmed.strip_prefix("./").unwrap_or(trimmed);
        let trimmed = trimmed
            .strip_suffix("...")
            .unwrap_or(trimmed)
            .trim_end_matches('/');

        if trimmed.is_empty() || trimmed == "." {
            return Ok(vec![self.root.clone()]);
        }

        if !trimmed.contains(['*', '?', '[']) {
            return Ok(vec![clean(&self.root.join(trimmed))]);
        }

        let full = self.root.join(trimmed);
        let full = full.to_string_lossy();
        let entries = glob::glob(&full)
            .map_err(|e| CovgateError::resolution(format!("invalid domain pattern {pattern:?}: {e}")))?;

        let mut dirs = Vec::new();
        for entry in entries {
            match entry {
                Ok(path) if path.is_dir() => dirs.push(clean(&path)),
                Ok(_) => {}
                Err(e) => tracing::debug!(error = %e, "unreadable path during domain expansion"),
            }
        }
        Ok(dirs)
    }
}

impl DomainResolver for FsDomainResolver {
    fn resolve(&self, domains: &[DomainSpec]) -> CovgateResult<DomainDirectories> {
        let mut resolved = DomainDirectories::new();
        for domain in domains {
            let mut dirs: Vec<PathBuf> = Vec::new();
            for pattern in &domain.match_patterns {
                for dir in self.expand(pattern)? {
                    if !dirs.contains(&dir) {
                        dirs.push(dir);
                    }
                }
            }
            if dirs.is_empty() {
                tracing::warn!(domain = %domain.name, "domain patterns matched no directories");
            }
            resolved.insert(domain.name.clone(), dirs);
        }
        Ok(resolved)
    }

    fn module_root(&self) -> &Path {
        &self.root
    }

    fn module_path(&self) -> &str {
        &self.module_path
    }
}

/// The `module` directive of `<root>/go.mod`
#[must_use]
pub fn read_go_module(root: &Path) -> Option<String> {
    let content = fs::read_to_string(root.join("go.mod")).ok()?;
    content.lines().find_map(|line| {
        let rest = line.trim().strip_prefix("module")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let name = rest.split("//").next()?.trim().trim_matches('"');
        (!name.is_empty()).then(|| name.to_string())
    })
}
