//! Path normalization.
//!
//! Parsers emit file keys in whatever shape the tool wrote them: absolute
//! paths, paths relative to the working directory, or import paths such as
//! `example.com/app/core/engine.go`. Everything is mapped into one key space:
//! slash-separated paths relative to the module root.
//!
//! JVM reports (JaCoCo in particular) key files by package path, e.g.
//! `com/example/core/Engine.java`. Such keys are looked up under the
//! conventional source roots when they do not exist directly under the
//! module root.

use crate::coverage::{CoverageMap, MergePolicy};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Maven/Gradle source roots, searched in order
pub const JVM_SOURCE_ROOTS: &[&str] = &[
    "src/main/java",
    "src/main/kotlin",
    "src/test/java",
    "src/test/kotlin",
];

/// Maps raw profile keys onto module-relative paths
#[derive(Debug, Clone)]
pub struct PathNormalizer {
    module_root: PathBuf,
    module_path: String,
    /// Directories (relative to the root) tried for package-relative keys
    source_roots: Vec<PathBuf>,
}

impl PathNormalizer {
    /// Create a normalizer for a module root and its import-path prefix
    #[must_use]
    pub fn new(module_root: impl Into<PathBuf>, module_path: impl Into<String>) -> Self {
        let module_path: String = module_path.into();
        Self {
            module_root: clean(&module_root.into()),
            module_path: module_path.trim_end_matches('/').to_string(),
            source_roots: Vec::new(),
        }
    }

    /// Look up relative keys that are missing under the root in these
    /// directories as well; the first one containing the file wins
    #[must_use]
    pub fn with_source_roots<I, P>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.source_roots = roots.into_iter().map(|r| r.as_ref().to_path_buf()).collect();
        self
    }

    /// The cleaned module root
    #[must_use]
    pub fn module_root(&self) -> &Path {
        &self.module_root
    }

    /// Resolve a raw key to a filesystem path
    #[must_use]
    pub fn resolve(&self, raw: &str) -> PathBuf {
        let key = raw.replace('\\', "/");

        if is_absolute(&key) {
            return clean(Path::new(&key));
        }

        if !self.module_path.is_empty() {
            if key == self.module_path {
                return self.module_root.clone();
            }
            if let Some(rest) = key
                .strip_prefix(&self.module_path)
                .and_then(|r| r.strip_prefix('/'))
            {
                return clean(&self.module_root.join(rest));
            }
        }

        let direct = clean(&self.module_root.join(&key));
        if self.source_roots.is_empty() || direct.exists() {
            return direct;
        }
        self.source_roots
            .iter()
            .map(|root| clean(&self.module_root.join(root).join(&key)))
            .find(|candidate| candidate.exists())
            .unwrap_or(direct)
    }

    /// Resolve a raw key and express it relative to the module root
    ///
    /// An absolute key outside the root that reaches it through a symlink
    /// is canonicalized before giving up.
    #[must_use]
    pub fn relative(&self, raw: &str) -> String {
        let resolved = self.resolve(raw);
        if let Some(rel) = self.strip_root(&resolved) {
            return rel;
        }
        fs::canonicalize(&resolved)
            .ok()
            .and_then(|canonical| self.strip_root(&canonical))
            .unwrap_or_else(|| to_slash(&resolved))
    }

    fn strip_root(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.module_root).ok()?;
        Some(if rel.as_os_str().is_empty() {
            ".".to_string()
        } else {
            to_slash(rel)
        })
    }

    /// Re-key a parsed coverage map to module-relative paths
    ///
    /// Keys that collapse onto the same path are summed.
    #[must_use]
    pub fn normalize_map(&self, files: CoverageMap) -> CoverageMap {
        let mut normalized = CoverageMap::new();
        for (raw, stat) in files {
            let key = self.relative(&raw);
            let entry = normalized.entry(key).or_default();
            *entry = entry.merged(stat, MergePolicy::Sum);
        }
        normalized
    }
}

fn is_absolute(key: &str) -> bool {
    if key.starts_with('/') {
        return true;
    }
    // Windows drive letter (C:/...)
    let bytes = key.as_bytes();
    bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && bytes[2] == b'/'
}

/// Lexically clean a path: drop `.`, resolve `..` against preceding segments
#[must_use]
pub fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = match out.components().next_back() {
                    Some(Component::Normal(_)) => out.pop(),
                    _ => false,
                };
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Render a path with forward slashes
#[must_use]
pub fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::RootDir => Some(String::new()),
            Component::CurDir => None,
            other => Some(other.as_os_str().to_string_lossy().into_owned()),
        })
        .collect::<Vec<_>>()
        .join("/")
}
