//! Configuration management for the CLI.
//!
//! Settings come from `pcascan.toml`: an explicit `--config` path, else
//! `./pcascan.toml`, else `<config dir>/pcascan/config.toml`. A missing
//! file means defaults.

use crate::error::{CliError, Result};
use pcascan_eval::EvalConfig;
use pcascan_extractor::ExtractorConfig;
use pcascan_jobs::JobsConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG: &str = "pcascan.toml";

/// CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Extraction pipeline settings
    pub extractor: ExtractorConfig,

    /// Evaluation settings
    pub eval: EvalConfig,

    /// Project and catalog locations
    pub paths: JobsConfig,

    /// Output settings
    pub settings: Settings,
}

/// Output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Enable colored output
    pub color: bool,

    /// Default output format
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

impl Config {
    /// Resolve the configuration file to read, if any.
    pub fn path(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        let local = PathBuf::from(LOCAL_CONFIG);
        if local.is_file() {
            return Some(local);
        }
        dirs::config_dir()
            .map(|dir| dir.join("pcascan").join("config.toml"))
            .filter(|path| path.is_file())
    }

    /// Load configuration, falling back to defaults when no file exists.
    ///
    /// An explicit path that does not exist is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let Some(path) = Self::path(explicit) else {
            return Ok(Self::default());
        };
        if !path.is_file() {
            return Err(CliError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let config = Self::from_toml(&fs::read_to_string(&path)?)?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parse and validate configuration from TOML.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.extractor
            .validate()
            .and_then(|_| self.eval.validate())
            .and_then(|_| self.paths.validate())
            .map_err(CliError::Config)
    }
}
