//! Configuration file schema and loading.
//!
//! ```yaml
//! version: 1
//! policy:
//!   default:
//!     min: 80
//!   domains:
//!     - name: core
//!       match: ["./internal/core/..."]
//!       min: 90
//! exclude: ["**/generated/**"]
//! files:
//!   - match: ["internal/core/**"]
//!     min: 60
//! diff:
//!   enabled: false
//!   base: origin/main
//! history:
//!   path: .covgate-history.json
//!   window: 10
//! profiles: [coverage.out]
//! ```

use crate::policy::{DomainSpec, FileRule, PatternSet, Policy};
use crate::result::{CovgateError, CovgateResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = ".covgate.yaml";

/// Schema version this build understands
pub const CONFIG_VERSION: u32 = 1;

/// Root configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub version: u32,
    pub policy: PolicyConfig,
    /// Global exclude patterns
    pub exclude: Vec<String>,
    /// Per-file thresholds
    pub files: Vec<FileRule>,
    pub diff: DiffConfig,
    pub history: HistoryConfig,
    /// Coverage profiles to read
    pub profiles: Vec<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            policy: PolicyConfig::default(),
            exclude: Vec::new(),
            files: Vec::new(),
            diff: DiffConfig::default(),
            history: HistoryConfig::default(),
            profiles: vec![PathBuf::from("coverage.out")],
        }
    }
}

/// Thresholds and domains
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub default: DefaultThreshold,
    pub domains: Vec<DomainSpec>,
}

/// Threshold for domains without their own `min`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultThreshold {
    pub min: f64,
}

impl Default for DefaultThreshold {
    fn default() -> Self {
        Self { min: 80.0 }
    }
}

/// Diff-only evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    pub enabled: bool,
    /// Base revision to diff against
    pub base: String,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base: "origin/main".to_string(),
        }
    }
}

/// History file and analysis window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub path: PathBuf,
    /// Entries considered for statistics and prediction
    pub window: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".covgate-history.json"),
            window: 10,
        }
    }
}

impl Config {
    /// Parse YAML text
    pub fn from_yaml_str(content: &str) -> CovgateResult<Self> {
        let config: Self = serde_yaml_ng::from_str(content)
            .map_err(|e| CovgateError::configuration(format!("invalid config: {e}")))?;
        if config.version != CONFIG_VERSION {
            return Err(CovgateError::configuration(format!(
                "unsupported config version {} (expected {CONFIG_VERSION})",
                config.version
            )));
        }
        Ok(config)
    }

    /// Render as YAML
    pub fn to_yaml(&self) -> CovgateResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Build and validate the policy
    pub fn policy(&self) -> CovgateResult<Policy> {
        Policy::new(self.policy.default.min, self.policy.domains.clone())
    }

    /// Validated file rules
    pub fn file_rules(&self) -> CovgateResult<Vec<FileRule>> {
        for rule in &self.files {
            rule.validate()?;
            PatternSet::new(&rule.match_patterns)?;
        }
        Ok(self.files.clone())
    }
}

/// Loads and stores configuration files
pub trait ConfigLoader {
    /// Read a configuration file
    fn load(&self, path: &Path) -> CovgateResult<Config>;

    /// Whether a configuration file exists
    fn exists(&self, path: &Path) -> bool;

    /// Write a configuration file
    fn save(&self, path: &Path, config: &Config) -> CovgateResult<()>;
}

/// YAML files on disk
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlConfigLoader;

impl ConfigLoader for YamlConfigLoader {
    fn load(&self, path: &Path) -> CovgateResult<Config> {
        let content = fs::read_to_string(path).map_err(|e| {
            CovgateError::configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        let config = Config::from_yaml_str(&content)?;
        tracing::debug!(path = %path.display(), domains = config.policy.domains.len(), "config loaded");
        Ok(config)
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn save(&self, path: &Path, config: &Config) -> CovgateResult<()> {
        fs::write(path, config.to_yaml()?)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
version: 1
policy:
  default:
    min: 75
  domains:
    - name: core
      match: ["./internal/core/..."]
      min: 90
      warn: 95
    - name: api
      match: ["./internal/api/..."]
      exclude: ["**/*_gen.go"]
exclude: ["**/mocks/**"]
files:
  - match: ["internal/core/**"]
    min: 60
diff:
  enabled: true
  base: main
history:
  path: build/history.json
  window: 5
profiles: [coverage.out, lcov.info]
"#;

    #[test]
    fn test_parse_full_config() {
        let config = Config::from_yaml_str(SAMPLE).unwrap();
        let policy = config.policy().unwrap();
        assert_eq!(policy.default_min(), 75.0);
        assert_eq!(policy.domains().len(), 2);
        assert_eq!(policy.domain("core").unwrap().warn, Some(95.0));
        assert_eq!(policy.domain("api").unwrap().exclude, vec!["**/*_gen.go"]);
        assert_eq!(config.exclude, vec!["**/mocks/**"]);
        assert_eq!(config.file_rules().unwrap().len(), 1);
        assert!(config.diff.enabled);
        assert_eq!(config.diff.base, "main");
        assert_eq!(config.history.window, 5);
        assert_eq!(config.profiles.len(), 2);
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config =
            Config::from_yaml_str("policy:\n  domains:\n    - name: all\n      match: [\".\"]\n")
                .unwrap();
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.policy.default.min, 80.0);
        assert_eq!(config.history.path, PathBuf::from(".covgate-history.json"));
        assert_eq!(config.profiles, vec![PathBuf::from("coverage.out")]);
        assert!(!config.diff.enabled);
    }

    #[test]
    fn test_empty_domains_fail_policy() {
        let config = Config::from_yaml_str("version: 1\n").unwrap();
        assert!(config.policy().unwrap_err().is_configuration());
    }

    #[test]
    fn test_unknown_version_rejected() {
        let err = Config::from_yaml_str("version: 7\n").unwrap_err();
        assert!(err.to_string().contains("unsupported config version 7"));
    }

    #[test]
    fn test_invalid_yaml_is_configuration_error() {
        assert!(Config::from_yaml_str("policy: [").unwrap_err().is_configuration());
    }

    #[test]
    fn test_bad_file_rule_rejected() {
        let mut config = Config::default();
        config.files.push(FileRule::new(&["["], 50.0));
        assert!(config.file_rules().is_err());
    }

    #[test]
    fn test_loader_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        let loader = YamlConfigLoader;
        assert!(!loader.exists(&path));

        let config = Config::from_yaml_str(SAMPLE).unwrap();
        loader.save(&path, &config).unwrap();
        assert!(loader.exists(&path));
        assert_eq!(loader.load(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = YamlConfigLoader.load(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(err.is_configuration());
    }
}
