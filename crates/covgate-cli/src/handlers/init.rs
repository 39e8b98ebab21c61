//! Detect and init command handlers

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::{to_json, OutputFormat, Reporter};
use crate::{DetectArgs, InitArgs};
use covgate::{Autodetector, Config, ConfigLoader, FsAutodetector, Language, YamlConfigLoader};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// What `covgate detect` reports
#[derive(Debug, Serialize)]
pub struct DetectReport {
    pub language: Language,
    pub module_root: PathBuf,
    pub module_path: String,
    pub config: Config,
}

impl DetectReport {
    /// Run autodetection from `dir`
    pub fn from_dir(dir: &Path) -> CliResult<Self> {
        let detector = FsAutodetector::new(dir);
        let detection = detector.detect()?;
        Ok(Self {
            language: detection.language,
            module_root: detection.module_root,
            module_path: detection.module_path,
            config: detector.detect_config()?,
        })
    }

    /// Plain-text rendering
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Language:    {}", self.language);
        let _ = writeln!(out, "Module root: {}", self.module_root.display());
        if !self.module_path.is_empty() {
            let _ = writeln!(out, "Module path: {}", self.module_path);
        }
        for profile in &self.config.profiles {
            let _ = writeln!(out, "Profile:     {}", profile.display());
        }
        let _ = writeln!(out, "Domains (min {:.0}%):", self.config.policy.default.min);
        for domain in &self.config.policy.domains {
            let _ = writeln!(out, "  {:<16} {}", domain.name, domain.match_patterns.join(", "));
        }
        out
    }
}

/// Execute the detect command
pub fn execute_detect(config: &CliConfig, args: &DetectArgs) -> CliResult<()> {
    let report = DetectReport::from_dir(config.dir())?;
    match OutputFormat::from(args.format) {
        OutputFormat::Json => println!("{}", to_json(&report)?),
        OutputFormat::Text => {
            Reporter::new(config.use_color(), config.verbosity.is_quiet()).block(&report.render());
        }
    }
    Ok(())
}

/// Execute the init command
pub fn execute_init(config: &CliConfig, args: &InitArgs) -> CliResult<PathBuf> {
    let report = DetectReport::from_dir(config.dir())?;
    let path = config
        .config_path
        .clone()
        .unwrap_or_else(|| report.module_root.join(covgate::DEFAULT_CONFIG_FILE));

    let loader = YamlConfigLoader;
    if loader.exists(&path) && !args.force {
        return Err(CliError::config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }

    loader.save(&path, &report.config)?;
    Reporter::new(config.use_color(), config.verbosity.is_quiet()).success(&format!(
        "wrote {} ({} project, {} domains)",
        path.display(),
        report.language,
        report.config.policy.domains.len()
    ));
    Ok(path)
}
