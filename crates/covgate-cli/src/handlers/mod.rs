//! Command handlers
//!
//! Every handler starts from a [`Project`]: the configuration in effect and
//! the directory it applies to.

pub mod check;
pub mod history;
pub mod init;
pub mod watch;

use crate::commands::PolicyArgs;
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use covgate::{
    Autodetector, Checker, Config, ConfigLoader, FsAutodetector, FsDomainResolver, GitDiffProvider,
    JsonHistoryStore, Language, SourceAnnotationScanner, YamlConfigLoader,
};
use std::path::{Path, PathBuf};

/// Where the configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Read from a YAML file
    File(PathBuf),
    /// Built by autodetection
    Detected(Language),
}

/// Configuration plus the root it is resolved against
#[derive(Debug, Clone)]
pub struct Project {
    pub config: Config,
    pub root: PathBuf,
    pub source: ConfigSource,
}

impl Project {
    /// Load the configuration file, falling back to autodetection
    ///
    /// An explicitly named file must exist; the default one may be absent.
    pub fn load(cli: &CliConfig) -> CliResult<Self> {
        let path = cli.config_file();
        let loader = YamlConfigLoader;

        if loader.exists(&path) {
            let config = loader.load(&path)?;
            let root = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map_or_else(|| cli.dir().to_path_buf(), Path::to_path_buf);
            tracing::info!(config = %path.display(), "configuration loaded");
            return Ok(Self {
                config,
                root,
                source: ConfigSource::File(path),
            });
        }

        if cli.config_path.is_some() {
            return Err(CliError::config(format!(
                "configuration file {} not found",
                path.display()
            )));
        }

        let detector = FsAutodetector::new(cli.dir());
        let detection = detector.detect()?;
        let config = detector.detect_config()?;
        tracing::info!(
            language = %detection.language,
            root = %detection.module_root.display(),
            domains = config.policy.domains.len(),
            "no configuration file, using autodetected policy"
        );
        Ok(Self {
            config,
            root: detection.module_root,
            source: ConfigSource::Detected(detection.language),
        })
    }

    /// Apply command-line overrides
    pub fn apply(&mut self, args: &PolicyArgs) -> CliResult<()> {
        if args.diff {
            self.config.diff.enabled = true;
        }
        if let Some(base) = &args.base {
            if base.trim().is_empty() {
                return Err(CliError::invalid_argument("--base must not be empty"));
            }
            base.clone_into(&mut self.config.diff.base);
        }
        self.override_profiles(&args.profiles)
    }

    /// Replace configured profiles with ones given on the command line
    ///
    /// Command-line paths are relative to the working directory, not the
    /// module root.
    pub fn override_profiles(&mut self, profiles: &[PathBuf]) -> CliResult<()> {
        if profiles.is_empty() {
            return Ok(());
        }
        let cwd = std::env::current_dir()?;
        self.config.profiles = profiles.iter().map(|p| cwd.join(p)).collect();
        Ok(())
    }

    /// Checker wired with the filesystem, git and annotation collaborators
    pub fn checker(&self) -> CliResult<Checker> {
        let resolver = FsDomainResolver::new(&self.root)?;
        Ok(Checker::new(self.config.clone(), Box::new(resolver))
            .with_diff(Box::new(GitDiffProvider::new(&self.root)))
            .with_annotations(Box::new(SourceAnnotationScanner::new())))
    }

    /// History store at the configured path, or `path` when given
    #[must_use]
    pub fn history_store(&self, path: Option<&Path>) -> JsonHistoryStore {
        let path = path.unwrap_or(&self.config.history.path);
        JsonHistoryStore::new(self.root.join(path))
    }
}
