//! Domain matching and per-domain aggregation.

use super::{AnnotationMap, PatternSet, Policy};
use crate::coverage::{CoverageMap, CoverageStat};
use crate::normalize::{clean, to_slash};
use crate::result::CovgateResult;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Resolved directories per domain name
pub type DomainDirectories = BTreeMap<String, Vec<PathBuf>>;

/// Per-domain totals plus the files that survived exclusion
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    /// Aggregated stat per configured domain (zero when nothing matched)
    pub domains: BTreeMap<String, CoverageStat>,
    /// Files left after global excludes and ignore annotations
    pub files: CoverageMap,
    /// Non-fatal findings
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone)]
struct DomainEntry {
    name: String,
    /// Directory prefixes, absolute
    absolute: Vec<String>,
    /// Directory prefixes relative to the module root
    relative: Vec<String>,
    exclude: PatternSet,
}

impl DomainEntry {
    fn owns(&self, relative: &str, absolute: &str) -> bool {
        self.relative.iter().any(|dir| has_prefix(relative, dir))
            || self.absolute.iter().any(|dir| has_prefix(absolute, dir))
    }
}

/// Assigns files to domains
///
/// Two independent exclusion passes apply: the global excludes drop a file
/// from every domain, and each domain's own excludes drop only that domain's
/// match.
#[derive(Debug, Clone)]
pub struct DomainMatcher {
    module_root: PathBuf,
    domains: Vec<DomainEntry>,
    global_excludes: PatternSet,
}

impl DomainMatcher {
    /// Build a matcher from a policy and the resolver's directory map
    pub fn new<S: AsRef<str>>(
        policy: &Policy,
        directories: &DomainDirectories,
        module_root: impl AsRef<Path>,
        global_excludes: &[S],
    ) -> CovgateResult<Self> {
        let module_root = clean(module_root.as_ref());
        let mut domains = Vec::with_capacity(policy.domains().len());

        for spec in policy.domains() {
            let dirs = directories.get(&spec.name).map_or(&[][..], Vec::as_slice);
            let mut absolute = Vec::with_capacity(dirs.len());
            let mut relative = Vec::with_capacity(dirs.len());
            for dir in dirs {
                let full = if dir.is_absolute() {
                    clean(dir)
                } else {
                    clean(&module_root.join(dir))
                };
                if let Ok(rel) = full.strip_prefix(&module_root) {
                    relative.push(to_slash(rel));
                }
                absolute.push(to_slash(&full));
            }
            domains.push(DomainEntry {
                name: spec.name.clone(),
                absolute,
                relative,
                exclude: PatternSet::new(&spec.exclude)?,
            });
        }

        Ok(Self {
            module_root,
            domains,
            global_excludes: PatternSet::new(global_excludes)?,
        })
    }

    /// Whether a file is dropped from every domain
    #[must_use]
    pub fn is_globally_excluded(&self, path: &str) -> bool {
        self.global_excludes.matches(path)
    }

    /// Whether a domain's own excludes drop the file from that domain
    #[must_use]
    pub fn is_domain_excluded(&self, domain: &str, path: &str) -> bool {
        self.domains
            .iter()
            .find(|d| d.name == domain)
            .is_some_and(|d| d.exclude.matches(path))
    }

    /// Names of every domain owning the file by directory, before excludes
    #[must_use]
    pub fn owners(&self, path: &str) -> Vec<&str> {
        let absolute = self.absolute(path);
        self.domains
            .iter()
            .filter(|d| d.owns(path, &absolute))
            .map(|d| d.name.as_str())
            .collect()
    }

    /// Aggregate module-relative file stats into per-domain totals
    #[must_use]
    pub fn aggregate(&self, files: &CoverageMap, annotations: &AnnotationMap) -> Aggregation {
        let mut aggregation = Aggregation {
            domains: self
                .domains
                .iter()
                .map(|d| (d.name.clone(), CoverageStat::default()))
                .collect(),
            ..Aggregation::default()
        };

        for (path, stat) in files {
            if self.is_globally_excluded(path) {
                tracing::debug!(file = %path, "globally excluded");
                continue;
            }

            if let Some(annotation) = annotations.get(path) {
                if annotation.ignore {
                    tracing::debug!(file = %path, "ignored by annotation");
                    continue;
                }
                if let Some(domain) = &annotation.domain_override {
                    match aggregation.domains.get_mut(domain) {
                        Some(total) => {
                            total.add(*stat);
                            aggregation.files.insert(path.clone(), *stat);
                        }
                        None => aggregation.warnings.push(format!(
                            "file {path} is annotated for unknown domain {domain}"
                        )),
                    }
                    continue;
                }
            }

            aggregation.files.insert(path.clone(), *stat);
            let absolute = self.absolute(path);
            for domain in &self.domains {
                if !domain.owns(path, &absolute) {
                    continue;
                }
                if domain.exclude.matches(path) {
                    tracing::debug!(file = %path, domain = %domain.name, "excluded from domain");
                    continue;
                }
                if let Some(total) = aggregation.domains.get_mut(&domain.name) {
                    total.add(*stat);
                }
            }
        }

        aggregation
    }

    fn absolute(&self, path: &str) -> String {
        let p = Path::new(path);
        if p.is_absolute() {
            to_slash(&clean(p))
        } else {
            to_slash(&clean(&self.module_root.join(p)))
        }
    }
}

/// `path` equals `dir` or lies below it
fn has_prefix(path: &str, dir: &str) -> bool {
    if dir.is_empty() {
        // the module root itself owns every relative path
        return !path.starts_with('/');
    }
    path == dir
        || path
            .strip_prefix(dir)
            .is_some_and(|rest| rest.starts_with('/') || dir.ends_with('/'))
}

/// One warning per directory owned by more than one domain
#[must_use]
pub fn overlap_warnings(directories: &DomainDirectories) -> Vec<String> {
    let mut owners: BTreeMap<String, BTreeSet<&str>> = BTreeMap::new();
    for (domain, dirs) in directories {
        for dir in dirs {
            owners
                .entry(to_slash(&clean(dir)))
                .or_default()
                .insert(domain.as_str());
        }
    }

    owners
        .into_iter()
        .filter(|(_, names)| names.len() > 1)
        .map(|(dir, names)| {
            let names: Vec<&str> = names.into_iter().collect();
            format!("directory {dir} belongs to {} domains", names.join(", "))
        })
        .collect()
}
