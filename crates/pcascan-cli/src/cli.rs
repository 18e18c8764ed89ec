//! CLI command definitions and argument parsing.

use clap::{Args, Parser, Subcommand};
use pcascan_extractor::ExtractorConfig;
use std::path::PathBuf;

/// pcascan - Extract potentially contaminating activities from site reports.
#[derive(Debug, Parser)]
#[command(name = "pcascan")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract PCA rows from a report's pages
    Extract(ExtractArgs),

    /// Score an experiment against ground truth
    Evaluate(EvaluateArgs),

    /// Extract and evaluate a benchmark project in one job
    Benchmark(BenchmarkArgs),

    /// List benchmark projects
    Projects(ProjectsArgs),
}

impl Command {
    /// Whether the command calls the model backend
    pub fn needs_gateway(&self) -> bool {
        matches!(self, Command::Extract(_) | Command::Benchmark(_))
    }
}

/// Model and chunking overrides shared by extract and benchmark.
#[derive(Debug, Clone, Default, Args)]
pub struct ModelArgs {
    /// Directory for experiment output
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Maximum words per chunk
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Model name
    #[arg(short, long)]
    pub model: Option<String>,

    /// Sampling temperature
    #[arg(short, long)]
    pub temperature: Option<f32>,

    /// File replacing the built-in extraction instructions
    #[arg(long)]
    pub prompt_template: Option<PathBuf>,

    /// Model backend API key
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

impl ModelArgs {
    /// Apply the overrides given on the command line
    pub fn apply(&self, config: &mut ExtractorConfig) {
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(words) = self.chunk_size {
            config.chunk_word_limit = words;
        }
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(temperature) = self.temperature {
            config.temperature = temperature;
        }
        if let Some(template) = &self.prompt_template {
            config.prompt_template = Some(template.clone());
        }
    }
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// Pages file (JSON array or form-feed separated text)
    #[arg(short, long)]
    pub pages: PathBuf,

    /// PCA definitions list
    #[arg(long)]
    pub pca_list: Option<PathBuf>,

    #[command(flatten)]
    pub model: ModelArgs,
}

/// Arguments for the evaluate command.
#[derive(Debug, Parser)]
pub struct EvaluateArgs {
    /// Experiment directory (exp_NNN)
    #[arg(short, long)]
    pub experiment: PathBuf,

    /// Ground truth CSV
    #[arg(short, long)]
    pub ground_truth: PathBuf,

    /// Only count ground truth rows from these sources
    #[arg(short, long, num_args = 1..)]
    pub sources: Vec<String>,

    /// Minimum address similarity for a match (0.0-1.0)
    #[arg(long)]
    pub threshold: Option<f64>,
}

/// Arguments for the benchmark command.
#[derive(Debug, Parser)]
pub struct BenchmarkArgs {
    /// Project identifier (directory name)
    #[arg(short, long)]
    pub project: String,

    /// Directory holding benchmark projects
    #[arg(long)]
    pub projects_dir: Option<PathBuf>,

    /// PCA definitions list
    #[arg(long)]
    pub pca_list: Option<PathBuf>,

    #[command(flatten)]
    pub model: ModelArgs,
}

/// Arguments for the projects command.
#[derive(Debug, Parser)]
pub struct ProjectsArgs {
    /// Directory holding benchmark projects
    #[arg(long)]
    pub projects_dir: Option<PathBuf>,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_command() {
        let cli = Cli::try_parse_from([
            "pcascan",
            "extract",
            "--pages",
            "report.txt",
            "--pca-list",
            "pca.txt",
            "--chunk-size",
            "500",
            "--api-key",
            "k",
        ])
        .unwrap();
        match cli.command {
            Command::Extract(args) => {
                assert_eq!(args.pages, PathBuf::from("report.txt"));
                assert_eq!(args.model.chunk_size, Some(500));
                assert_eq!(args.model.api_key.as_deref(), Some("k"));
            }
            _ => panic!("Expected Extract command"),
        }
    }

    #[test]
    fn test_evaluate_sources() {
        let cli = Cli::try_parse_from([
            "pcascan",
            "evaluate",
            "-e",
            "output/exp_001",
            "-g",
            "gt.csv",
            "--sources",
            "ERIS",
            "CD",
        ])
        .unwrap();
        match cli.command {
            Command::Evaluate(args) => assert_eq!(args.sources, vec!["ERIS", "CD"]),
            _ => panic!("Expected Evaluate command"),
        }
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["pcascan"]).is_err());
    }

    #[test]
    fn test_needs_gateway() {
        let cli = Cli::try_parse_from(["pcascan", "projects"]).unwrap();
        assert!(!cli.command.needs_gateway());

        let cli = Cli::try_parse_from(["pcascan", "benchmark", "-p", "site_a"]).unwrap();
        assert!(cli.command.needs_gateway());
    }

    #[test]
    fn test_model_args_override() {
        let args = ModelArgs {
            model: Some("gemini-2.5-pro".to_string()),
            temperature: Some(0.0),
            ..ModelArgs::default()
        };
        let mut config = ExtractorConfig::default();
        args.apply(&mut config);

        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.temperature, 0.0);
        assert_eq!(config.chunk_word_limit, ExtractorConfig::default().chunk_word_limit);
    }
}
