//! Configuration for evaluation

use serde::{Deserialize, Serialize};

/// Configuration for record linkage and ground truth loading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Minimum address score for a match
    pub match_threshold: f64,

    /// Ground truth address column header
    pub address_column: String,

    /// Ground truth PCA column header
    pub pca_column: String,

    /// Ground truth source column header
    pub source_column: String,

    /// Sources kept when a benchmark does not name any
    pub default_sources: Vec<String>,
}

impl EvalConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.match_threshold) {
            return Err(format!(
                "match_threshold {} out of range [0.0, 1.0]",
                self.match_threshold
            ));
        }
        if self.address_column.is_empty() || self.pca_column.is_empty() {
            return Err("address_column and pca_column must not be empty".to_string());
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

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            match_threshold: 0.5,
            address_column: "Address".to_string(),
            pca_column: "Potentially Contaminating Activity (PCA)".to_string(),
            source_column: "Source".to_string(),
            default_sources: vec!["ERIS".to_string()],
        }
    }
}
