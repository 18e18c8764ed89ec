//! Configuration for job services
//!
//! Locates benchmark projects and the PCA catalog, and sizes the progress
//! channel handed to observers.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the extraction and benchmark services
///
/// # Examples
///
/// ```
/// use pcascan_jobs::JobsConfig;
///
/// let config = JobsConfig::default();
/// assert_eq!(config.event_buffer, 64);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobsConfig {
    /// Directory holding one subdirectory per benchmark project
    pub projects_dir: PathBuf,

    /// PCA catalog used by benchmark jobs
    pub pca_list: PathBuf,

    /// Capacity of each job's progress channel
    /// Events are dropped, not awaited, once it is full
    pub event_buffer: usize,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            projects_dir: PathBuf::from("projects"),
            pca_list: PathBuf::from("data/pca_definitions.txt"),
            event_buffer: 64,
        }
    }
}

impl JobsConfig {
    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.event_buffer == 0 {
            return Err("event_buffer must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
