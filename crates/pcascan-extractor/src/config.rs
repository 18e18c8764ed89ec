//! Configuration for the extraction pipeline

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the extraction pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Maximum words per chunk (a single oversized page still forms a chunk)
    pub chunk_word_limit: usize,

    /// Backend model name
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Progress reported once setup is done and chunking starts
    pub progress_baseline: f32,

    /// Progress reported once the last chunk is processed
    pub progress_chunk_band_end: f32,

    /// Progress reported when the compile pass starts
    pub progress_compile: f32,

    /// Progress reported when final artifacts are written
    pub progress_persist: f32,

    /// Smallest valid PCA number
    pub pca_min: i64,

    /// Largest valid PCA number
    pub pca_max: i64,

    /// Directory under which `exp_NNN` experiment directories are created
    pub output_dir: PathBuf,

    /// Optional file replacing the built-in extraction instructions
    pub prompt_template: Option<PathBuf>,
}

impl ExtractorConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_word_limit == 0 {
            return Err("chunk_word_limit must be greater than 0".to_string());
        }
        if self.model.trim().is_empty() {
            return Err("model must not be empty".to_string());
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(format!("temperature {} out of range [0.0, 2.0]", self.temperature));
        }
        let milestones = [
            self.progress_baseline,
            self.progress_chunk_band_end,
            self.progress_compile,
            self.progress_persist,
        ];
        if milestones.iter().any(|p| !(0.0..=100.0).contains(p)) {
            return Err("progress milestones must be within [0, 100]".to_string());
        }
        if milestones.windows(2).any(|w| w[0] > w[1]) {
            return Err("progress milestones must be non-decreasing".to_string());
        }
        if self.pca_min > self.pca_max {
            return Err(format!(
                "pca_min {} cannot exceed pca_max {}",
                self.pca_min, self.pca_max
            ));
        }
        Ok(())
    }

    /// Progress while chunk `index` (1-based) of `total` is being processed
    pub fn chunk_progress(&self, index: usize, total: usize) -> f32 {
        if total == 0 {
            return self.progress_chunk_band_end;
        }
        let band = self.progress_chunk_band_end - self.progress_baseline;
        self.progress_baseline + (index.saturating_sub(1) as f32 / total as f32) * band
    }

    /// Use the progress milestones of benchmark jobs, which reserve the tail
    /// of the bar for evaluation
    pub fn with_benchmark_progress(mut self) -> Self {
        self.progress_baseline = 15.0;
        self.progress_chunk_band_end = 70.0;
        self.progress_compile = 75.0;
        self.progress_persist = 85.0;
        self
    }
}

impl Default for ExtractorConfig {
    /// Default configuration used by the extraction service
    fn default() -> Self {
        Self {
            chunk_word_limit: 10_000,
            model: "gemini-2.5-flash".to_string(),
            temperature: 0.1,
            progress_baseline: 20.0,
            progress_chunk_band_end: 80.0,
            progress_compile: 85.0,
            progress_persist: 95.0,
            pca_min: 1,
            pca_max: 59,
            output_dir: PathBuf::from("output"),
            prompt_template: None,
        }
    }
}

impl ExtractorConfig {
    /// Fine-grained preset: small chunks, deterministic sampling
    pub fn fine_grained() -> Self {
        Self {
            chunk_word_limit: 4_000,
            temperature: 0.0,
            ..Self::default()
        }
    }

    /// Coarse preset: large chunks for fewer, longer model calls
    pub fn coarse() -> Self {
        Self {
            chunk_word_limit: 25_000,
            temperature: 0.2,
            ..Self::default()
        }
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
